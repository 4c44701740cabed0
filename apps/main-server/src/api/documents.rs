//! Shared document endpoints.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use entities::{Document, DocumentPatch, WorkspaceMember};
use protocol::{
    requests::{CreateDocumentRequest, DocumentIdRequest, UpdateDocumentRequest, WorkspaceIdRequest},
    responses::{DeletedResponse, DocumentListResponse, DocumentResponse},
};
use store::Store;
use tracing::info;
use uuid::Uuid;

use crate::api::{require_member, required_text, resolve_user};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Loads a document along with the caller's membership in its workspace.
async fn load_document<S: Store>(
    state: &AppState<S>,
    document_id: Uuid,
    user_id: Uuid,
) -> ServerResult<(Document, WorkspaceMember)> {
    let document = state
        .store
        .get_document(document_id)
        .await?
        .ok_or(ServerError::NotFound("Document"))?;
    let member = require_member(state, document.workspace_id, user_id)
        .await
        .map_err(|e| match e {
            ServerError::NotFound(_) => ServerError::NotFound("Document"),
            other => other,
        })?;
    Ok((document, member))
}

/// Creates an empty document.
pub async fn create_document<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<CreateDocumentRequest>,
) -> ServerResult<Json<DocumentResponse>> {
    let title = required_text(&request.title, "title")?;
    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let document = state
        .store
        .create_document(Document::new(request.workspace_id, user.id, title))
        .await?;
    info!(document_id = %document.id, workspace_id = %document.workspace_id, "Created document");

    Ok(Json(DocumentResponse { document }))
}

/// Lists a workspace's documents, most recently updated first.
pub async fn list_documents<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<WorkspaceIdRequest>,
) -> ServerResult<Json<DocumentListResponse>> {
    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let documents = state.store.list_documents(request.workspace_id).await?;
    Ok(Json(DocumentListResponse { documents }))
}

pub async fn get_document<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<DocumentIdRequest>,
) -> ServerResult<Json<DocumentResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let (document, _) = load_document(&state, request.document_id, user.id).await?;
    Ok(Json(DocumentResponse { document }))
}

/// Replaces a document's title and/or content.
pub async fn update_document<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<UpdateDocumentRequest>,
) -> ServerResult<Json<DocumentResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let (document, _) = load_document(&state, request.document_id, user.id).await?;

    let patch = DocumentPatch {
        title: request
            .title
            .as_deref()
            .map(|t| required_text(t, "title"))
            .transpose()?,
        content: request.content,
    };
    let document = state.store.update_document(document.id, patch).await?;
    info!(document_id = %document.id, user_id = %user.id, "Updated document");

    Ok(Json(DocumentResponse { document }))
}

/// Deletes a document. Allowed for its creator and workspace owners/admins.
pub async fn delete_document<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<DocumentIdRequest>,
) -> ServerResult<Json<DeletedResponse>> {
    let user = resolve_user(&state, &identity).await?;
    let (document, member) = load_document(&state, request.document_id, user.id).await?;
    if document.created_by_id != user.id && !member.role.can_manage() {
        return Err(ServerError::PermissionDenied(
            "only the creator or a workspace admin can delete this document".to_string(),
        ));
    }

    state.store.delete_document(document.id).await?;
    info!(document_id = %document.id, user_id = %user.id, "Deleted document");

    Ok(Json(DeletedResponse {}))
}
