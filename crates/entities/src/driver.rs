//! Driver entity definitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{GeoPoint, Rating, aggregate_rating};

/// Licence and vehicle details a driver registers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProfile {
    /// Driving licence number.
    pub license_number: String,
    /// Vehicle make and model.
    pub vehicle_model: String,
    /// Vehicle colour.
    pub vehicle_color: String,
    /// Licence plate.
    pub vehicle_plate: String,
}

impl DriverProfile {
    /// Returns the name of the first blank field, if any.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("license_number", &self.license_number),
            ("vehicle_model", &self.vehicle_model),
            ("vehicle_color", &self.vehicle_color),
            ("vehicle_plate", &self.vehicle_plate),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    /// Returns a copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            license_number: self.license_number.trim().to_string(),
            vehicle_model: self.vehicle_model.trim().to_string(),
            vehicle_color: self.vehicle_color.trim().to_string(),
            vehicle_plate: self.vehicle_plate.trim().to_string(),
        }
    }
}

/// Driver extension of a user with role `driver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Driving licence number.
    pub license_number: String,
    /// Vehicle make and model.
    pub vehicle_model: String,
    /// Vehicle colour.
    pub vehicle_color: String,
    /// Licence plate.
    pub vehicle_plate: String,
    /// Whether the driver is ready to accept new rides.
    pub is_available: bool,
    /// Last reported position.
    pub current_location: Option<GeoPoint>,
    /// Running average of review ratings, two decimal places.
    pub rating: Decimal,
    /// Number of reviews folded into `rating`.
    pub total_rides: i32,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// Creates a new available driver with no rating history.
    pub fn new(user_id: Uuid, profile: DriverProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            license_number: profile.license_number,
            vehicle_model: profile.vehicle_model,
            vehicle_color: profile.vehicle_color,
            vehicle_plate: profile.vehicle_plate,
            is_available: true,
            current_location: None,
            rating: Decimal::new(0, 2),
            total_rides: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces licence and vehicle details, leaving availability and rating intact.
    pub fn update_profile(&mut self, profile: DriverProfile) {
        self.license_number = profile.license_number;
        self.vehicle_model = profile.vehicle_model;
        self.vehicle_color = profile.vehicle_color;
        self.vehicle_plate = profile.vehicle_plate;
        self.updated_at = Utc::now();
    }

    /// Folds a new review rating into the running average.
    pub fn record_rating(&mut self, rating: Rating) {
        self.rating = aggregate_rating(self.rating, self.total_rides, rating);
        self.total_rides += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DriverProfile {
        DriverProfile {
            license_number: "D1234567".to_string(),
            vehicle_model: "Toyota Prius".to_string(),
            vehicle_color: "Silver".to_string(),
            vehicle_plate: "ABC-123".to_string(),
        }
    }

    #[test]
    fn test_new_driver_is_available_and_unrated() {
        let driver = Driver::new(Uuid::new_v4(), profile());

        assert!(driver.is_available);
        assert_eq!(driver.rating, Decimal::ZERO);
        assert_eq!(driver.total_rides, 0);
        assert!(driver.current_location.is_none());
    }

    #[test]
    fn test_blank_profile_field_is_reported() {
        let mut profile = profile();
        assert_eq!(profile.first_blank_field(), None);

        profile.vehicle_color = "  ".to_string();
        assert_eq!(profile.first_blank_field(), Some("vehicle_color"));
    }

    #[test]
    fn test_update_profile_keeps_rating() {
        let mut driver = Driver::new(Uuid::new_v4(), profile());
        driver.record_rating(Rating::new(4).unwrap());

        let mut updated = profile();
        updated.vehicle_plate = "XYZ-999".to_string();
        driver.update_profile(updated);

        assert_eq!(driver.vehicle_plate, "XYZ-999");
        assert_eq!(driver.total_rides, 1);
        assert_eq!(driver.rating, Decimal::new(400, 2));
    }

    #[test]
    fn test_record_rating_updates_average_and_count() {
        let mut driver = Driver::new(Uuid::new_v4(), profile());
        driver.rating = Decimal::new(400, 2);
        driver.total_rides = 3;

        driver.record_rating(Rating::new(5).unwrap());

        assert_eq!(driver.rating, Decimal::new(425, 2));
        assert_eq!(driver.total_rides, 4);
    }
}
