//! Authentication middleware.

use std::sync::Arc;

use auth::Identity;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use store::Store;

use crate::error::ServerError;
use crate::state::AppState;

/// Extracts the bearer token from the Authorization header.
fn extract_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Validates the bearer token and stores the caller's [`Identity`] in the
/// request extensions. Requests without a valid token are rejected with 401.
pub async fn auth_middleware<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&request) else {
        return ServerError::AuthenticationRequired.into_response();
    };

    let identity = match state
        .jwt_manager
        .validate_token(token)
        .and_then(Identity::try_from)
    {
        Ok(identity) => identity,
        Err(e) => return ServerError::Auth(e).into_response(),
    };

    tracing::debug!(external_id = %identity.external_id, "Authenticated request");
    request.extensions_mut().insert(identity);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::HeaderValue};

    use super::*;

    fn request_with(header: Option<&'static str>) -> Request {
        let mut request = Request::new(Body::empty());
        if let Some(value) = header {
            request
                .headers_mut()
                .insert(AUTHORIZATION, HeaderValue::from_static(value));
        }
        request
    }

    #[test]
    fn test_extract_token_valid() {
        let request = request_with(Some("Bearer test-token-123"));
        assert_eq!(extract_token(&request), Some("test-token-123"));
    }

    #[test]
    fn test_extract_token_rejects_other_schemes() {
        assert_eq!(extract_token(&request_with(Some("Basic credentials"))), None);
        assert_eq!(extract_token(&request_with(Some("Bearer   "))), None);
        assert_eq!(extract_token(&request_with(None)), None);
    }
}
