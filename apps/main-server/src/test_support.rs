//! Helpers for driving the router in tests.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use store::MemoryStore;
use tower::ServiceExt;

use crate::config::Config;
use crate::state::SharedState;
use crate::{create_app, create_state};

const SECRET: &str = "test-secret-key-must-be-long-enough-for-security";

pub(crate) struct TestApp {
    pub state: SharedState<MemoryStore>,
    app: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let config =
            Config::from_lookup(|key| (key == "HAIL_JWT_SECRET").then(|| SECRET.to_string()))
                .unwrap();
        let state = create_state(config, MemoryStore::new());
        let app = create_app(state.clone());
        Self { state, app }
    }

    /// Mints a token for `subject` with email `<subject>@example.com`.
    pub fn token(&self, subject: &str) -> String {
        self.state
            .jwt_manager
            .generate_token(subject, &format!("{subject}@example.com"), Some(subject.to_string()))
            .unwrap()
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = Request::post(path).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = request.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::get(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// Posts and asserts a 200, returning the body.
    pub async fn ok(&self, path: &str, token: &str, body: Value) -> Value {
        let (status, json) = self.post(path, Some(token), body).await;
        assert_eq!(status, StatusCode::OK, "{path} failed: {json}");
        json
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
