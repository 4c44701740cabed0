//! Review endpoints.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use entities::Rating;
use protocol::{
    requests::{ListDriverReviewsRequest, RideIdRequest, SubmitReviewRequest},
    responses::{OptionalReviewResponse, ReviewListResponse, ReviewResponse},
};
use store::{ReviewSubmission, Store};
use tracing::info;

use crate::api::{MAX_HISTORY_PAGE, load_visible_ride, optional_text, page_request, resolve_user};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Rates the driver of one of the caller's completed rides.
pub async fn submit_review<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<SubmitReviewRequest>,
) -> ServerResult<Json<ReviewResponse>> {
    let rating = Rating::new(request.rating)
        .ok_or_else(|| ServerError::invalid("rating must be between 1 and 5"))?;

    let user = resolve_user(&state, &identity).await?;
    let review = state
        .store
        .create_review(ReviewSubmission {
            ride_id: request.ride_id,
            rider_id: user.id,
            rating,
            comment: optional_text(request.comment),
        })
        .await?;
    info!(
        review_id = %review.id,
        ride_id = %review.ride_id,
        driver_id = %review.driver_id,
        rating = review.rating.get(),
        "Review submitted"
    );

    Ok(Json(ReviewResponse { review }))
}

/// Returns the review of a ride the caller rode in or drove, if any.
pub async fn get_review<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<RideIdRequest>,
) -> ServerResult<Json<OptionalReviewResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let ride = load_visible_ride(&state, &user, request.ride_id).await?;

    let review = state.store.get_review_by_ride(ride.id).await?;
    Ok(Json(OptionalReviewResponse { review }))
}

/// Lists a driver's reviews, newest first.
pub async fn list_for_driver<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(request): ApiJson<ListDriverReviewsRequest>,
) -> ServerResult<Json<ReviewListResponse>> {
    let page = page_request(&request.page, MAX_HISTORY_PAGE)?;
    state
        .store
        .get_driver(request.driver_id)
        .await?
        .ok_or(ServerError::NotFound("Driver"))?;

    let page = state
        .store
        .list_reviews_for_driver(request.driver_id, page)
        .await?;
    Ok(Json(ReviewListResponse {
        reviews: page.items,
        next_cursor: page.next_cursor,
    }))
}
