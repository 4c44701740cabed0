//! Health check endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use protocol::responses::{HealthEnvironment, HealthResponse};
use store::Store;

use crate::state::AppState;

/// Reports liveness and which integrations are configured.
pub async fn health_check<S: Store>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        environment: HealthEnvironment {
            has_database: state.config.has_database(),
            has_auth: !state.config.jwt_secret.is_empty(),
            has_maps: state.config.has_maps(),
        },
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use protocol::paths;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let app = TestApp::new();

        let (status, body) = app.get(paths::HEALTH).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"]["has_database"], false);
        assert_eq!(body["environment"]["has_auth"], true);
        assert_eq!(body["environment"]["has_maps"], false);
    }
}
