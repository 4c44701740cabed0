//! User endpoints.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use protocol::{requests::UpdatePhoneRequest, responses::UserResponse};
use store::Store;
use tracing::info;

use crate::api::{optional_text, resolve_user};
use crate::error::ServerResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Creates the caller's user record if needed and returns it.
pub async fn sync_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
) -> ServerResult<Json<UserResponse>> {
    let user = resolve_user(&state, &identity).await?;
    Ok(Json(UserResponse { user }))
}

/// Returns the caller's user record.
pub async fn get_me<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
) -> ServerResult<Json<UserResponse>> {
    let user = resolve_user(&state, &identity).await?;
    Ok(Json(UserResponse { user }))
}

/// Sets or clears the caller's phone number.
pub async fn update_phone<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<UpdatePhoneRequest>,
) -> ServerResult<Json<UserResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let phone = optional_text(request.phone);

    let user = state.store.update_user_phone(user.id, phone).await?;
    info!(user_id = %user.id, has_phone = user.phone.is_some(), "Updated phone");

    Ok(Json(UserResponse { user }))
}
