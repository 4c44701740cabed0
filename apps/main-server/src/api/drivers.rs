//! Driver registration and availability endpoints.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use entities::{DriverProfile, GeoPoint};
use protocol::{
    requests::{PageParams, RegisterDriverRequest, SetAvailabilityRequest, UpdateLocationRequest},
    responses::{DriverListResponse, DriverResponse, OptionalDriverResponse},
};
use store::Store;
use tracing::info;

use crate::api::{MAX_DRIVER_PAGE, page_request, resolve_driver, resolve_user};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Registers the caller as a driver, or updates their licence and vehicle.
pub async fn register_driver<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<RegisterDriverRequest>,
) -> ServerResult<Json<DriverResponse>> {
    let profile = DriverProfile {
        license_number: request.license_number,
        vehicle_model: request.vehicle_model,
        vehicle_color: request.vehicle_color,
        vehicle_plate: request.vehicle_plate,
    };
    if let Some(field) = profile.first_blank_field() {
        return Err(ServerError::invalid(format!("{field} is required")));
    }

    let user = resolve_user(&state, &identity).await?;
    let driver = state.store.register_driver(user.id, profile.trimmed()).await?;
    info!(driver_id = %driver.id, user_id = %user.id, "Registered driver");

    Ok(Json(DriverResponse { driver }))
}

/// Returns the caller's driver profile, if any.
pub async fn get_my_driver<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
) -> ServerResult<Json<OptionalDriverResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let driver = state.store.get_driver_by_user(user.id).await?;
    Ok(Json(OptionalDriverResponse { driver }))
}

/// Goes on or off duty.
pub async fn set_availability<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<SetAvailabilityRequest>,
) -> ServerResult<Json<DriverResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let driver = resolve_driver(&state, &user).await?;

    let driver = state
        .store
        .set_driver_availability(driver.id, request.is_available)
        .await?;
    info!(driver_id = %driver.id, is_available = driver.is_available, "Set availability");

    Ok(Json(DriverResponse { driver }))
}

/// Records the driver's current position.
pub async fn update_location<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<UpdateLocationRequest>,
) -> ServerResult<Json<DriverResponse>> {
    let location = GeoPoint::new(request.lat, request.lng);
    if !location.is_valid() {
        return Err(ServerError::invalid("coordinates are out of range"));
    }

    let user = resolve_user(&state, &identity).await?;
    let driver = resolve_driver(&state, &user).await?;
    let driver = state.store.update_driver_location(driver.id, location).await?;

    Ok(Json(DriverResponse { driver }))
}

/// Lists drivers currently accepting rides.
pub async fn list_available<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<PageParams>,
) -> ServerResult<Json<DriverListResponse>> {
    let page = page_request(&request, MAX_DRIVER_PAGE)?;
    let page = state.store.list_available_drivers(page).await?;

    Ok(Json(DriverListResponse {
        drivers: page.items,
        next_cursor: page.next_cursor,
    }))
}
