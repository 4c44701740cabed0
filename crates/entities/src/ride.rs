//! Ride entity and its lifecycle.
//!
//! A ride moves forward through a fixed transition table:
//!
//! ```text
//! pending ──accept──▶ accepted ──start──▶ in_progress ──complete──▶ completed
//!    │                   │
//!    └──cancel──▶ cancelled ◀──cancel──┘
//! ```
//!
//! A driver is bound exactly while the ride is `accepted`, `in_progress` or
//! `completed`. Cancelling an accepted ride releases its driver.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{FareQuote, Place};

/// Status of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Waiting for a driver.
    #[default]
    Pending,
    /// Bound to a driver who is on the way.
    Accepted,
    /// Rider is on board.
    InProgress,
    /// Dropped off.
    Completed,
    /// Withdrawn by the rider.
    Cancelled,
}

impl RideStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [RideStatus; 5] = [
        Self::Pending,
        Self::Accepted,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Converts the status to a string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Cancelled)
                | (Self::Accepted, Self::InProgress)
                | (Self::Accepted, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
        )
    }

    /// Returns true if a ride in this status must have a driver bound.
    pub fn has_driver(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress | Self::Completed)
    }

    /// Returns true while the bound driver is busy with the ride.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move ride from {from} to {to}")]
pub struct InvalidTransition {
    /// Status the ride was in.
    pub from: RideStatus,
    /// Status that was requested.
    pub to: RideStatus,
}

/// One transportation request from creation to a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Unique identifier.
    pub id: Uuid,
    /// Requesting rider (user ID).
    pub rider_id: Uuid,
    /// Bound driver; set iff the status has a driver.
    pub driver_id: Option<Uuid>,
    /// Pickup location.
    pub pickup: Place,
    /// Dropoff location.
    pub dropoff: Place,
    /// Current status.
    pub status: RideStatus,
    /// Price of the ride.
    pub fare: Decimal,
    /// Route distance in kilometres.
    pub distance_km: Decimal,
    /// Estimated travel time in minutes.
    pub duration_minutes: i32,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// Creates a pending ride priced by `quote`.
    pub fn new(rider_id: Uuid, pickup: Place, dropoff: Place, quote: FareQuote) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            rider_id,
            driver_id: None,
            pickup,
            dropoff,
            status: RideStatus::Pending,
            fare: quote.fare,
            distance_km: quote.distance_km,
            duration_minutes: i32::try_from(quote.duration_minutes).unwrap_or(i32::MAX),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the driver invariant holds for this ride.
    pub fn is_consistent(&self) -> bool {
        self.driver_id.is_some() == self.status.has_driver()
    }

    fn advance(&mut self, to: RideStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Binds `driver_id` to a pending ride.
    pub fn accept(&mut self, driver_id: Uuid) -> Result<(), InvalidTransition> {
        self.advance(RideStatus::Accepted)?;
        self.driver_id = Some(driver_id);
        Ok(())
    }

    /// Picks up the rider.
    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        self.advance(RideStatus::InProgress)
    }

    /// Drops off the rider.
    pub fn complete(&mut self) -> Result<(), InvalidTransition> {
        self.advance(RideStatus::Completed)
    }

    /// Cancels the ride, returning the driver that was released, if any.
    pub fn cancel(&mut self) -> Result<Option<Uuid>, InvalidTransition> {
        self.advance(RideStatus::Cancelled)?;
        Ok(self.driver_id.take())
    }
}
