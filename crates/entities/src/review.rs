//! Review and rating definitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::round_cents;

/// A star rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Creates a rating, returning `None` when out of range.
    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            u8::try_from(value).ok().map(Self)
        } else {
            None
        }
    }

    /// Returns the numeric value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("rating must be between 1 and 5, got {value}"))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Running average after adding one rating: `(avg × n + r) / (n + 1)`, two decimal places.
pub fn aggregate_rating(current_average: Decimal, rated_count: i32, rating: Rating) -> Decimal {
    let count = Decimal::from(rated_count.max(0));
    let total = current_average * count + Decimal::from(rating.get());
    round_cents(total / (count + Decimal::ONE))
}

/// A rider's review of a completed ride. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Unique identifier.
    pub id: Uuid,
    /// Reviewed ride; at most one review per ride.
    pub ride_id: Uuid,
    /// Rider who wrote the review.
    pub rider_id: Uuid,
    /// Driver of the ride, copied for lookups by driver.
    pub driver_id: Uuid,
    /// Star rating.
    pub rating: Rating,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Creates a new review.
    pub fn new(ride_id: Uuid, rider_id: Uuid, driver_id: Uuid, rating: Rating) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_id,
            rider_id,
            driver_id,
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the comment. Blank comments are dropped.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        let comment = comment.trim();
        self.comment = (!comment.is_empty()).then(|| comment.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        assert!(Rating::new(-1).is_none());
        assert_eq!(Rating::new(1).map(Rating::get), Some(1));
        assert_eq!(Rating::new(5).map(Rating::get), Some(5));
    }

    #[test]
    fn test_rating_deserialization_rejects_out_of_range() {
        let rating: Rating = serde_json::from_str("4").unwrap();
        assert_eq!(rating.get(), 4);
        assert!(serde_json::from_str::<Rating>("9").is_err());
        assert_eq!(serde_json::to_string(&rating).unwrap(), "4");
    }

    #[test]
    fn test_aggregate_from_existing_average() {
        let average = aggregate_rating(Decimal::new(400, 2), 3, Rating::new(5).unwrap());
        assert_eq!(average, Decimal::new(425, 2));
    }

    #[test]
    fn test_first_rating_becomes_average() {
        let average = aggregate_rating(Decimal::ZERO, 0, Rating::new(3).unwrap());
        assert_eq!(average, Decimal::new(3, 0));
    }

    #[test]
    fn test_aggregate_rounds_to_two_places() {
        // (5 * 2 + 4) / 3 = 4.6666... -> 4.67
        let average = aggregate_rating(Decimal::new(5, 0), 2, Rating::new(4).unwrap());
        assert_eq!(average, Decimal::new(467, 2));
    }

    #[test]
    fn test_blank_comment_is_dropped() {
        let rating = Rating::new(5).unwrap();
        let review = Review::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), rating)
            .with_comment("  ");
        assert!(review.comment.is_none());

        let review = review.with_comment(" Smooth ride ");
        assert_eq!(review.comment.as_deref(), Some("Smooth ride"));
    }
}
