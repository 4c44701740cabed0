//! Ride endpoints: quoting, requesting, matching and the ride lifecycle.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use entities::{Ride, RideStatus};
use protocol::{
    requests::{
        CreateRideRequest, EstimateFareRequest, PageParams, RideIdRequest,
        UpdateRideStatusRequest,
    },
    responses::{EstimateFareResponse, RideListResponse, RideResponse},
};
use store::{Store, StoreError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{
    MAX_DRIVER_PAGE, MAX_HISTORY_PAGE, load_visible_ride, page_request, resolve_driver,
    resolve_user,
};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::services::pricing;
use crate::state::AppState;

const BACK_TO_PENDING: &str = "a ride cannot be moved back to pending";

/// Quotes a fare without creating a ride.
pub async fn estimate_fare<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<EstimateFareRequest>,
) -> ServerResult<Json<EstimateFareResponse>> {
    let from = pricing::check_point(&request.pickup, "pickup")?;
    let to = pricing::check_point(&request.dropoff, "dropoff")?;

    let quote = pricing::quote(
        state.router.as_ref(),
        from,
        to,
        request.distance_km,
        request.duration_minutes,
    )
    .await?;

    Ok(Json(quote))
}

/// Requests a ride. The fare is always computed server-side.
pub async fn create_ride<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<CreateRideRequest>,
) -> ServerResult<Json<RideResponse>> {
    let (from, to) = pricing::check_trip(&request.pickup, &request.dropoff)?;
    let quote = pricing::quote(
        state.router.as_ref(),
        from,
        to,
        request.distance_km,
        request.duration_minutes,
    )
    .await?;

    let user = resolve_user(&state, &identity).await?;
    let mut pickup = request.pickup;
    pickup.address = pickup.address.trim().to_string();
    let mut dropoff = request.dropoff;
    dropoff.address = dropoff.address.trim().to_string();

    let ride = state
        .store
        .create_ride(Ride::new(user.id, pickup, dropoff, quote))
        .await?;
    info!(ride_id = %ride.id, rider_id = %user.id, fare = %ride.fare, "Ride requested");

    Ok(Json(RideResponse { ride }))
}

/// Returns a ride the caller rides in or drives.
pub async fn get_ride<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<RideIdRequest>,
) -> ServerResult<Json<RideResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let ride = load_visible_ride(&state, &user, request.ride_id).await?;
    Ok(Json(RideResponse { ride }))
}

/// Lists the caller's rides as a rider, newest first.
pub async fn list_my_rides<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<PageParams>,
) -> ServerResult<Json<RideListResponse>> {
    let page = page_request(&request, MAX_HISTORY_PAGE)?;
    let user = resolve_user(&state, &identity).await?;
    let page = state.store.list_rides_for_rider(user.id, page).await?;

    Ok(Json(RideListResponse {
        rides: page.items,
        next_cursor: page.next_cursor,
    }))
}

/// Withdraws the caller's ride while it is pending or accepted.
pub async fn cancel_ride<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<RideIdRequest>,
) -> ServerResult<Json<RideResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let ride = cancel(&state, user.id, request.ride_id).await?;
    Ok(Json(RideResponse { ride }))
}

/// Moves a ride to `status` through the operation owning that edge.
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<UpdateRideStatusRequest>,
) -> ServerResult<Json<RideResponse>> {
    let target = request.status;
    if target == RideStatus::Pending {
        return Err(ServerError::invalid(BACK_TO_PENDING));
    }

    let user = resolve_user(&state, &identity).await?;
    // Pending rides are open to any driver, so only non-pending rides need
    // to be visible to the caller before the status check.
    let ride = match state.store.get_ride(request.ride_id).await? {
        Some(ride) if ride.status == RideStatus::Pending => ride,
        _ => load_visible_ride(&state, &user, request.ride_id).await?,
    };
    if !ride.status.can_transition_to(target) {
        warn!(ride_id = %ride.id, from = %ride.status, to = %target, "Rejected status change");
        return Err(StoreError::InvalidStateTransition {
            from: ride.status,
            to: target,
        }
        .into());
    }

    let ride = match target {
        RideStatus::Cancelled => cancel(&state, user.id, ride.id).await?,
        RideStatus::Accepted => {
            let driver = resolve_driver(&state, &user).await?;
            accept(&state, driver.id, ride.id).await?
        }
        RideStatus::InProgress => {
            let driver = resolve_driver(&state, &user).await?;
            state.store.start_ride(ride.id, driver.id).await?
        }
        RideStatus::Completed => {
            let driver = resolve_driver(&state, &user).await?;
            state.store.complete_ride(ride.id, driver.id).await?
        }
        RideStatus::Pending => return Err(ServerError::invalid(BACK_TO_PENDING)),
    };
    info!(ride_id = %ride.id, status = %ride.status, "Ride status updated");

    Ok(Json(RideResponse { ride }))
}

/// Lists rides waiting for a driver, oldest first.
pub async fn list_pending<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<PageParams>,
) -> ServerResult<Json<RideListResponse>> {
    let page = page_request(&request, MAX_DRIVER_PAGE)?;
    let user = resolve_user(&state, &identity).await?;
    resolve_driver(&state, &user).await?;

    let page = state.store.list_pending_rides(page).await?;
    Ok(Json(RideListResponse {
        rides: page.items,
        next_cursor: page.next_cursor,
    }))
}

/// Claims a pending ride for the calling driver.
pub async fn accept_ride<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<RideIdRequest>,
) -> ServerResult<Json<RideResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let driver = resolve_driver(&state, &user).await?;
    let ride = accept(&state, driver.id, request.ride_id).await?;
    Ok(Json(RideResponse { ride }))
}

/// Picks up the rider of an accepted ride.
pub async fn start_ride<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<RideIdRequest>,
) -> ServerResult<Json<RideResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let driver = resolve_driver(&state, &user).await?;

    let ride = state.store.start_ride(request.ride_id, driver.id).await?;
    info!(ride_id = %ride.id, driver_id = %driver.id, "Ride started");

    Ok(Json(RideResponse { ride }))
}

/// Drops off the rider.
pub async fn complete_ride<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<RideIdRequest>,
) -> ServerResult<Json<RideResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let driver = resolve_driver(&state, &user).await?;

    let ride = state.store.complete_ride(request.ride_id, driver.id).await?;
    info!(ride_id = %ride.id, driver_id = %driver.id, fare = %ride.fare, "Ride completed");

    Ok(Json(RideResponse { ride }))
}

/// Lists rides the calling driver has been bound to, newest first.
pub async fn list_driver_rides<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<PageParams>,
) -> ServerResult<Json<RideListResponse>> {
    let page = page_request(&request, MAX_HISTORY_PAGE)?;
    let user = resolve_user(&state, &identity).await?;
    let driver = resolve_driver(&state, &user).await?;

    let page = state.store.list_rides_for_driver(driver.id, page).await?;
    Ok(Json(RideListResponse {
        rides: page.items,
        next_cursor: page.next_cursor,
    }))
}

async fn accept<S: Store>(
    state: &AppState<S>,
    driver_id: Uuid,
    ride_id: Uuid,
) -> ServerResult<Ride> {
    let ride = state.store.accept_ride(ride_id, driver_id).await?;
    info!(ride_id = %ride.id, driver_id = %driver_id, "Ride accepted");
    Ok(ride)
}

async fn cancel<S: Store>(
    state: &AppState<S>,
    rider_id: Uuid,
    ride_id: Uuid,
) -> ServerResult<Ride> {
    let ride = state.store.cancel_ride(ride_id, rider_id).await?;
    info!(ride_id = %ride.id, rider_id = %rider_id, "Ride cancelled");
    Ok(ride)
}
