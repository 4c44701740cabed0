//! API endpoints.

pub mod board;
pub mod chat;
pub mod documents;
pub mod drivers;
pub mod health;
pub mod reviews;
pub mod rides;
pub mod users;
pub mod workspaces;

use auth::Identity;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use entities::{Driver, Ride, User, WorkspaceMember};
use pagination::PageRequest;
use protocol::{paths, requests::PageParams};
use store::Store;
use tracing::info;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::middleware::auth::auth_middleware;
use crate::state::{AppState, SharedState};

/// Page size cap for driver listings and the pending-ride queue.
pub const MAX_DRIVER_PAGE: u32 = 20;
/// Page size cap for ride histories and reviews.
pub const MAX_HISTORY_PAGE: u32 = 50;
/// Page size cap for chat polling.
pub const MAX_CHAT_PAGE: u32 = 100;

/// Creates the API router with all endpoints.
pub fn create_router<S: Store>(state: SharedState<S>) -> Router {
    let api: Router<SharedState<S>> = Router::new()
        // User endpoints
        .route(paths::USER_SYNC, post(users::sync_user))
        .route(paths::USER_ME, post(users::get_me))
        .route(paths::USER_UPDATE_PHONE, post(users::update_phone))
        // Driver endpoints
        .route(paths::DRIVER_REGISTER, post(drivers::register_driver))
        .route(paths::DRIVER_ME, post(drivers::get_my_driver))
        .route(paths::DRIVER_SET_AVAILABILITY, post(drivers::set_availability))
        .route(paths::DRIVER_UPDATE_LOCATION, post(drivers::update_location))
        .route(paths::DRIVER_LIST_AVAILABLE, post(drivers::list_available))
        .route(paths::DRIVER_PENDING_RIDES, post(rides::list_pending))
        .route(paths::DRIVER_ACCEPT, post(rides::accept_ride))
        .route(paths::DRIVER_START, post(rides::start_ride))
        .route(paths::DRIVER_COMPLETE, post(rides::complete_ride))
        .route(paths::DRIVER_RIDES, post(rides::list_driver_rides))
        // Ride endpoints
        .route(paths::RIDE_ESTIMATE, post(rides::estimate_fare))
        .route(paths::RIDE_CREATE, post(rides::create_ride))
        .route(paths::RIDE_GET, post(rides::get_ride))
        .route(paths::RIDE_LIST_MINE, post(rides::list_my_rides))
        .route(paths::RIDE_CANCEL, post(rides::cancel_ride))
        .route(paths::RIDE_UPDATE_STATUS, post(rides::update_status))
        // Review endpoints
        .route(paths::REVIEW_SUBMIT, post(reviews::submit_review))
        .route(paths::REVIEW_GET, post(reviews::get_review))
        .route(paths::REVIEW_LIST_FOR_DRIVER, post(reviews::list_for_driver))
        // Workspace endpoints
        .route(paths::WORKSPACE_CREATE, post(workspaces::create_workspace))
        .route(paths::WORKSPACE_LIST, post(workspaces::list_workspaces))
        .route(paths::WORKSPACE_ADD_MEMBER, post(workspaces::add_member))
        .route(paths::WORKSPACE_MEMBERS, post(workspaces::list_members))
        // Board endpoints
        .route(paths::TASK_CREATE, post(board::create_task))
        .route(paths::TASK_UPDATE, post(board::update_task))
        .route(paths::TASK_REORDER, post(board::reorder_tasks))
        .route(paths::TASK_LIST, post(board::list_tasks))
        .route(paths::TASK_DELETE, post(board::delete_task))
        // Chat endpoints
        .route(paths::CHAT_SEND, post(chat::send_message))
        .route(paths::CHAT_LIST, post(chat::list_messages))
        // Document endpoints
        .route(paths::DOCUMENT_CREATE, post(documents::create_document))
        .route(paths::DOCUMENT_LIST, post(documents::list_documents))
        .route(paths::DOCUMENT_GET, post(documents::get_document))
        .route(paths::DOCUMENT_UPDATE, post(documents::update_document))
        .route(paths::DOCUMENT_DELETE, post(documents::delete_document))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    Router::new()
        .route(paths::HEALTH, get(health::health_check))
        .merge(api)
        .with_state(state)
}

/// Returns the caller's local user, creating it on first sight.
pub(crate) async fn resolve_user<S: Store>(
    state: &AppState<S>,
    identity: &Identity,
) -> ServerResult<User> {
    if let Some(user) = state
        .store
        .get_user_by_external_id(&identity.external_id)
        .await?
    {
        return Ok(user);
    }

    let mut user = User::new(&identity.external_id, &identity.email);
    if let Some(name) = &identity.name {
        user = user.with_name(name);
    }
    let user = state.store.ensure_user(user).await?;
    info!(user_id = %user.id, external_id = %user.external_id, "Synced user");
    Ok(user)
}

/// Returns the caller's driver profile. Callers without one get not found.
pub(crate) async fn resolve_driver<S: Store>(
    state: &AppState<S>,
    user: &User,
) -> ServerResult<Driver> {
    state
        .store
        .get_driver_by_user(user.id)
        .await?
        .ok_or(ServerError::NotFound("Driver"))
}

/// Loads a ride the caller may see: their own, or one bound to their driver profile.
pub(crate) async fn load_visible_ride<S: Store>(
    state: &AppState<S>,
    user: &User,
    ride_id: Uuid,
) -> ServerResult<Ride> {
    let ride = state
        .store
        .get_ride(ride_id)
        .await?
        .ok_or(ServerError::NotFound("Ride"))?;
    if ride.rider_id == user.id {
        return Ok(ride);
    }

    if let Some(driver_id) = ride.driver_id {
        let driver = state.store.get_driver_by_user(user.id).await?;
        if driver.is_some_and(|d| d.id == driver_id) {
            return Ok(ride);
        }
    }
    Err(ServerError::NotFound("Ride"))
}

/// Returns the caller's membership. Non-members cannot tell the workspace exists.
pub(crate) async fn require_member<S: Store>(
    state: &AppState<S>,
    workspace_id: Uuid,
    user_id: Uuid,
) -> ServerResult<WorkspaceMember> {
    state
        .store
        .get_workspace_member(workspace_id, user_id)
        .await?
        .ok_or(ServerError::NotFound("Workspace"))
}

/// Builds a page request from client paging parameters.
pub(crate) fn page_request(params: &PageParams, max: u32) -> ServerResult<PageRequest> {
    Ok(PageRequest::bounded(params.limit, max).after_token(params.cursor.as_deref())?)
}

/// Trims a required text field, rejecting blank values.
pub(crate) fn required_text(value: &str, field: &str) -> ServerResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServerError::invalid(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Trims an optional text field, treating blank values as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
