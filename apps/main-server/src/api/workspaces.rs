//! Workspace endpoints.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use entities::{MemberRole, Workspace, WorkspaceMember};
use protocol::{
    requests::{AddMemberRequest, CreateWorkspaceRequest, WorkspaceIdRequest},
    responses::{
        MemberListResponse, MemberResponse, MemberView, WorkspaceListResponse, WorkspaceResponse,
    },
};
use store::Store;
use tracing::info;

use crate::api::{optional_text, require_member, required_text, resolve_user};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Creates a workspace owned by the caller.
pub async fn create_workspace<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<CreateWorkspaceRequest>,
) -> ServerResult<Json<WorkspaceResponse>> {
    let name = required_text(&request.name, "name")?;
    let user = resolve_user(&state, &identity).await?;

    let mut workspace = Workspace::new(name, user.id);
    if let Some(description) = optional_text(request.description) {
        workspace = workspace.with_description(description);
    }
    let workspace = state.store.create_workspace(workspace).await?;
    info!(workspace_id = %workspace.id, owner_id = %user.id, "Created workspace");

    Ok(Json(WorkspaceResponse { workspace }))
}

/// Lists workspaces the caller belongs to.
pub async fn list_workspaces<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
) -> ServerResult<Json<WorkspaceListResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let workspaces = state.store.list_workspaces_for_user(user.id).await?;
    Ok(Json(WorkspaceListResponse { workspaces }))
}

/// Adds an existing user to a workspace. Owners and admins only.
pub async fn add_member<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<AddMemberRequest>,
) -> ServerResult<Json<MemberResponse>> {
    let role = request.role.unwrap_or(MemberRole::Member);
    if role == MemberRole::Owner {
        return Err(ServerError::invalid("the owner role cannot be granted"));
    }
    let email = required_text(&request.email, "email")?;

    let user = resolve_user(&state, &identity).await?;
    let membership = require_member(&state, request.workspace_id, user.id).await?;
    if !membership.role.can_manage() {
        return Err(ServerError::PermissionDenied(
            "only owners and admins can add members".to_string(),
        ));
    }

    let invitee = state
        .store
        .get_user_by_email(&email)
        .await?
        .ok_or(ServerError::NotFound("User"))?;
    let member = state
        .store
        .add_workspace_member(WorkspaceMember::new(request.workspace_id, invitee.id, role))
        .await?;
    info!(
        workspace_id = %member.workspace_id,
        user_id = %member.user_id,
        role = member.role.as_str(),
        "Added member"
    );

    Ok(Json(MemberResponse { member }))
}

/// Lists a workspace's members.
pub async fn list_members<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<WorkspaceIdRequest>,
) -> ServerResult<Json<MemberListResponse>> {
    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let members = state
        .store
        .list_workspace_members(request.workspace_id)
        .await?
        .into_iter()
        .map(|m| MemberView {
            member: m.member,
            name: m.user.name,
            email: m.user.email,
            avatar_url: m.user.avatar_url,
        })
        .collect();

    Ok(Json(MemberListResponse { members }))
}
