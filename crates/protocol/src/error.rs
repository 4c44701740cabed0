//! Error codes and error bodies.

use serde::{Deserialize, Serialize};

/// Application error codes carried in error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request body was malformed or failed validation.
    InvalidRequest = -32600,
    /// Unexpected server-side failure.
    InternalError = -32603,
    /// Missing, invalid or expired credentials.
    Unauthorized = -32001,
    /// Authenticated but not allowed to perform this action.
    Forbidden = -32002,
    /// The resource does not exist or is not visible to the caller.
    NotFound = -32003,
    /// The request conflicts with the current state.
    Conflict = -32004,
}

impl ErrorCode {
    /// Numeric value sent on the wire.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -32600 => ErrorCode::InvalidRequest,
            -32001 => ErrorCode::Unauthorized,
            -32002 => ErrorCode::Forbidden,
            -32003 => ErrorCode::NotFound,
            -32004 => ErrorCode::Conflict,
            _ => ErrorCode::InternalError,
        }
    }
}

/// The `error` object of an error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ApiError {
    /// Error code.
    pub code: i32,
    /// Human readable message.
    pub message: String,
}

impl ApiError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }

    /// Returns the typed error code.
    pub fn kind(&self) -> ErrorCode {
        ErrorCode::from(self.code)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Authentication required")
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{resource} not found"))
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
    }
}

/// Body of every non-2xx response: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

impl From<ApiError> for ErrorBody {
    fn from(error: ApiError) -> Self {
        Self { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_round_trip() {
        for code in [
            ErrorCode::InvalidRequest,
            ErrorCode::Unauthorized,
            ErrorCode::Forbidden,
            ErrorCode::NotFound,
            ErrorCode::Conflict,
            ErrorCode::InternalError,
        ] {
            assert_eq!(ErrorCode::from(code.code()), code);
        }
        assert_eq!(ErrorCode::from(7), ErrorCode::InternalError);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody::from(ApiError::not_found("Ride"));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["code"], -32003);
        assert_eq!(json["error"]["message"], "Ride not found");
    }
}
