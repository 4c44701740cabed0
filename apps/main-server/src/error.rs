//! Server error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use protocol::{ApiError, ErrorBody, ErrorCode};
use store::StoreError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found, or not visible to the caller.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authentication required.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Authentication error.
    #[error("Auth error: {0}")]
    Auth(#[from] auth::AuthError),

    /// Malformed page cursor.
    #[error("Invalid cursor: {0}")]
    Cursor(#[from] pagination::CursorError),

    /// The request body is not the JSON the endpoint expects.
    #[error("Malformed body: {0}")]
    Body(#[from] JsonRejection),
}

impl ServerError {
    /// Creates an invalid request error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    fn status_and_body(&self) -> (StatusCode, ApiError) {
        match self {
            ServerError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new(ErrorCode::InvalidRequest, msg.clone()),
            ),
            ServerError::Cursor(_) => (
                StatusCode::BAD_REQUEST,
                ApiError::new(ErrorCode::InvalidRequest, "Invalid cursor"),
            ),
            ServerError::Body(rejection) => (
                StatusCode::BAD_REQUEST,
                ApiError::new(ErrorCode::InvalidRequest, rejection.body_text()),
            ),
            ServerError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, ApiError::not_found(resource))
            }
            ServerError::AuthenticationRequired => {
                (StatusCode::UNAUTHORIZED, ApiError::unauthorized())
            }
            ServerError::Auth(e) => (
                StatusCode::UNAUTHORIZED,
                ApiError::new(ErrorCode::Unauthorized, e.to_string()),
            ),
            ServerError::PermissionDenied(msg) => (
                StatusCode::FORBIDDEN,
                ApiError::new(ErrorCode::Forbidden, msg.clone()),
            ),
            ServerError::Store(e) => match e {
                StoreError::NotFound { entity_type, .. } => {
                    (StatusCode::NOT_FOUND, ApiError::not_found(entity_type))
                }
                StoreError::AlreadyExists { .. }
                | StoreError::Conflict(_)
                | StoreError::InvalidStateTransition { .. } => (
                    StatusCode::CONFLICT,
                    ApiError::new(ErrorCode::Conflict, e.to_string()),
                ),
                StoreError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new(ErrorCode::InvalidRequest, msg.clone()),
                ),
                StoreError::Database(_) | StoreError::InvalidData(_) => {
                    tracing::error!(error = %e, "Store failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal())
                }
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        if status.is_client_error() {
            tracing::warn!(
                status = status.as_u16(),
                code = error.code,
                message = %error.message,
                "Request rejected"
            );
        }
        (status, Json(ErrorBody::from(error))).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use entities::RideStatus;

    use super::*;

    #[test]
    fn test_store_errors_map_to_statuses() {
        let cases = [
            (StoreError::not_found("Ride", "x"), StatusCode::NOT_FOUND),
            (StoreError::already_exists("Review", "x"), StatusCode::CONFLICT),
            (StoreError::conflict("driver is not available"), StatusCode::CONFLICT),
            (
                StoreError::InvalidStateTransition {
                    from: RideStatus::Completed,
                    to: RideStatus::Cancelled,
                },
                StatusCode::CONFLICT,
            ),
            (StoreError::validation("bad"), StatusCode::BAD_REQUEST),
            (StoreError::InvalidData("status 'lost'".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let (status, _) = ServerError::from(err).status_and_body();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_internal_details_are_redacted() {
        let (status, body) =
            ServerError::from(StoreError::InvalidData("column secret_x".into())).status_and_body();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, ErrorCode::InternalError.code());
        assert!(!body.message.contains("secret_x"));
    }

    #[test]
    fn test_not_found_hides_identifier() {
        let (_, body) = ServerError::from(StoreError::not_found("Ride", "1234")).status_and_body();
        assert_eq!(body.message, "Ride not found");
    }
}
