//! Hail main server.
//!
//! HTTP API for the ride marketplace (riders, drivers, rides, reviews) and
//! the team suite (workspaces, board, chat, documents). Handlers are generic
//! over the [`Store`] so the same router runs on PostgreSQL or in memory.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use auth::{JwtConfig, JwtManager};
use axum::Router;
use store::Store;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::services::routing::StraightLineRouter;
use crate::state::{AppState, SharedState};

/// Creates the application router with all routes configured.
pub fn create_app<S: Store>(state: SharedState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state with the given configuration and store.
pub fn create_state<S: Store>(config: Config, store: S) -> SharedState<S> {
    let jwt_manager = JwtManager::new(
        JwtConfig::new(&config.jwt_secret)
            .with_issuer(&config.jwt_issuer)
            .with_expiration_hours(config.jwt_expiration_hours),
    );

    Arc::new(AppState::new(
        config,
        store,
        jwt_manager,
        Box::new(StraightLineRouter::new()),
    ))
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
