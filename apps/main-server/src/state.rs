//! Application state.

use std::sync::Arc;

use auth::JwtManager;
use store::Store;

use crate::config::Config;
use crate::services::routing::RoutingProvider;

/// Shared application state.
pub struct AppState<S: Store> {
    /// Server configuration.
    pub config: Config,
    /// Persistence.
    pub store: S,
    /// Bearer token validation.
    pub jwt_manager: JwtManager,
    /// Route estimation for fare quotes.
    pub router: Box<dyn RoutingProvider>,
}

impl<S: Store> AppState<S> {
    /// Creates new application state.
    pub fn new(
        config: Config,
        store: S,
        jwt_manager: JwtManager,
        router: Box<dyn RoutingProvider>,
    ) -> Self {
        Self {
            config,
            store,
            jwt_manager,
            router,
        }
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;
