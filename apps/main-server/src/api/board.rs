//! Kanban board endpoints.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use entities::{BoardTask, TaskPatch};
use protocol::{
    requests::{
        CreateTaskRequest, ReorderTasksRequest, TaskIdRequest, UpdateTaskRequest,
        WorkspaceIdRequest,
    },
    responses::{DeletedResponse, TaskListResponse, TaskResponse},
};
use store::Store;
use tracing::info;
use uuid::Uuid;

use crate::api::{optional_text, require_member, required_text, resolve_user};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Checks that an assignee belongs to the workspace.
async fn check_assignee<S: Store>(
    state: &AppState<S>,
    workspace_id: Uuid,
    assignee_id: Uuid,
) -> ServerResult<()> {
    state
        .store
        .get_workspace_member(workspace_id, assignee_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServerError::invalid("assignee must be a member of the workspace"))
}

/// Loads a task from a workspace the caller belongs to.
async fn load_task<S: Store>(
    state: &AppState<S>,
    task_id: Uuid,
    user_id: Uuid,
) -> ServerResult<BoardTask> {
    let task = state
        .store
        .get_board_task(task_id)
        .await?
        .ok_or(ServerError::NotFound("Task"))?;
    require_member(state, task.workspace_id, user_id)
        .await
        .map_err(|e| match e {
            ServerError::NotFound(_) => ServerError::NotFound("Task"),
            other => other,
        })?;
    Ok(task)
}

/// Adds a task to the end of its column.
pub async fn create_task<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ServerResult<Json<TaskResponse>> {
    let title = required_text(&request.title, "title")?;
    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let mut task = BoardTask::new(request.workspace_id, user.id, title)
        .with_status(request.status.unwrap_or_default())
        .with_priority(request.priority.unwrap_or_default());
    if let Some(description) = optional_text(request.description) {
        task = task.with_description(description);
    }
    if let Some(assignee_id) = request.assignee_id {
        check_assignee(&state, request.workspace_id, assignee_id).await?;
        task = task.with_assignee(assignee_id);
    }
    if let Some(due_date) = request.due_date {
        task = task.with_due_date(due_date);
    }

    let task = state.store.create_board_task(task).await?;
    info!(
        task_id = %task.id,
        workspace_id = %task.workspace_id,
        status = task.status.as_str(),
        "Created task"
    );

    Ok(Json(TaskResponse { task }))
}

/// Partially updates a task. Changing its status moves it to the end of the new column.
pub async fn update_task<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> ServerResult<Json<TaskResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let task = load_task(&state, request.task_id, user.id).await?;

    let title = request
        .title
        .as_deref()
        .map(|t| required_text(t, "title"))
        .transpose()?;
    if let Some(Some(assignee_id)) = request.assignee_id {
        check_assignee(&state, task.workspace_id, assignee_id).await?;
    }

    let patch = TaskPatch {
        title,
        description: request.description.map(optional_text),
        status: request.status,
        priority: request.priority,
        assignee_id: request.assignee_id,
        due_date: request.due_date,
    };
    let task = state.store.update_board_task(task.id, patch).await?;
    info!(
        task_id = %task.id,
        status = task.status.as_str(),
        position = task.position,
        "Updated task"
    );

    Ok(Json(TaskResponse { task }))
}

/// Rewrites the order of a column.
pub async fn reorder_tasks<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<ReorderTasksRequest>,
) -> ServerResult<Json<TaskListResponse>> {
    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let tasks = state
        .store
        .reorder_board_tasks(request.workspace_id, request.status, &request.task_ids)
        .await?;
    info!(
        workspace_id = %request.workspace_id,
        status = request.status.as_str(),
        count = request.task_ids.len(),
        "Reordered tasks"
    );

    Ok(Json(TaskListResponse { tasks }))
}

/// Returns the whole board.
pub async fn list_tasks<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<WorkspaceIdRequest>,
) -> ServerResult<Json<TaskListResponse>> {
    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let tasks = state.store.list_board_tasks(request.workspace_id).await?;
    Ok(Json(TaskListResponse { tasks }))
}

/// Removes a task.
pub async fn delete_task<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<TaskIdRequest>,
) -> ServerResult<Json<DeletedResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let task = load_task(&state, request.task_id, user.id).await?;

    state.store.delete_board_task(task.id).await?;
    info!(task_id = %task.id, workspace_id = %task.workspace_id, "Deleted task");

    Ok(Json(DeletedResponse {}))
}
