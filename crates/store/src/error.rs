//! Store error types.

use entities::{InvalidTransition, RideStatus};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found, or not visible to the caller.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Duplicate entity.
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// The ride is not in a status that permits the requested step.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: RideStatus, to: RideStatus },

    /// The operation lost a race or violates a business rule.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected by the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped back to an entity.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(entity_type: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<InvalidTransition> for StoreError {
    fn from(err: InvalidTransition) -> Self {
        Self::InvalidStateTransition {
            from: err.from,
            to: err.to,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
