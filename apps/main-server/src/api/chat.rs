//! Workspace chat endpoints. Clients poll `chat/list` with the cursor from
//! their previous call.

use std::sync::Arc;

use auth::Identity;
use axum::{Extension, Json, extract::State};
use entities::{MAX_MESSAGE_CHARS, Message};
use pagination::{Cursor, PageRequest};
use protocol::{
    requests::{ListMessagesRequest, SendMessageRequest},
    responses::{MessageListResponse, MessageResponse},
};
use store::Store;
use tracing::info;

use crate::api::{MAX_CHAT_PAGE, require_member, resolve_user};
use crate::error::{ServerError, ServerResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Posts a message.
pub async fn send_message<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> ServerResult<Json<MessageResponse>> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(ServerError::invalid("content is required"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ServerError::invalid(format!(
            "content is limited to {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let message = state
        .store
        .create_message(Message::new(request.workspace_id, user.id, content))
        .await?;
    info!(message_id = %message.message.id, workspace_id = %request.workspace_id, "Message sent");

    Ok(Json(MessageResponse { message }))
}

/// Returns messages after the given cursor, oldest first.
pub async fn list_messages<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<Identity>,
    ApiJson(request): ApiJson<ListMessagesRequest>,
) -> ServerResult<Json<MessageListResponse>> {
    let page = PageRequest::bounded(request.limit, MAX_CHAT_PAGE)
        .after_token(request.after.as_deref())?;
    let user = resolve_user(&state, &identity).await?;
    require_member(&state, request.workspace_id, user.id).await?;

    let resume_from = page.cursor().map(Cursor::encode);
    let page = state.store.list_messages(request.workspace_id, page).await?;
    let cursor = page
        .items
        .last()
        .map(|m| Cursor::new(m.message.created_at, m.message.id).encode())
        .or(resume_from);

    Ok(Json(MessageListResponse {
        has_more: page.next_cursor.is_some(),
        messages: page.items,
        cursor,
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use protocol::paths;
    use serde_json::json;

    use crate::api::workspaces::tests::{create_workspace, join};
    use crate::test_support::TestApp;

    #[tokio::test]
    async fn test_polling_returns_only_newer_messages() {
        let app = TestApp::new();
        let owner = app.token("owner");
        let ws = create_workspace(&app, &owner).await;
        let member = join(&app, &owner, &ws, "member").await;

        app.ok(paths::CHAT_SEND, &owner, json!({ "workspace_id": ws["id"], "content": "hi" }))
            .await;
        let first = app.ok(paths::CHAT_LIST, &member, json!({ "workspace_id": ws["id"] })).await;
        assert_eq!(first["messages"].as_array().unwrap().len(), 1);
        assert_eq!(first["messages"][0]["user_name"], "owner");
        assert_eq!(first["has_more"], false);

        // Nothing new: the cursor is handed back unchanged.
        let idle = app
            .ok(
                paths::CHAT_LIST,
                &member,
                json!({ "workspace_id": ws["id"], "after": first["cursor"] }),
            )
            .await;
        assert!(idle["messages"].as_array().unwrap().is_empty());
        assert_eq!(idle["cursor"], first["cursor"]);

        tokio::time::sleep(Duration::from_millis(2)).await;
        app.ok(paths::CHAT_SEND, &member, json!({ "workspace_id": ws["id"], "content": "yo" }))
            .await;
        let next = app
            .ok(
                paths::CHAT_LIST,
                &owner,
                json!({ "workspace_id": ws["id"], "after": idle["cursor"] }),
            )
            .await;
        assert_eq!(next["messages"].as_array().unwrap().len(), 1);
        assert_eq!(next["messages"][0]["content"], "yo");
    }

    #[tokio::test]
    async fn test_page_limit_reports_more() {
        let app = TestApp::new();
        let owner = app.token("owner");
        let ws = create_workspace(&app, &owner).await;
        for n in 0..3 {
            let body = json!({ "workspace_id": ws["id"], "content": format!("m{n}") });
            app.ok(paths::CHAT_SEND, &owner, body).await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let page = app
            .ok(paths::CHAT_LIST, &owner, json!({ "workspace_id": ws["id"], "limit": 2 }))
            .await;
        assert_eq!(page["messages"].as_array().unwrap().len(), 2);
        assert_eq!(page["has_more"], true);

        let rest = app
            .ok(
                paths::CHAT_LIST,
                &owner,
                json!({ "workspace_id": ws["id"], "after": page["cursor"] }),
            )
            .await;
        assert_eq!(rest["messages"][0]["content"], "m2");
    }

    #[tokio::test]
    async fn test_content_rules() {
        let app = TestApp::new();
        let owner = app.token("owner");
        let ws = create_workspace(&app, &owner).await;

        let (status, _) = app
            .post(
                paths::CHAT_SEND,
                Some(&owner),
                json!({ "workspace_id": ws["id"], "content": "   " }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let long = "x".repeat(4001);
        let (status, _) = app
            .post(
                paths::CHAT_SEND,
                Some(&owner),
                json!({ "workspace_id": ws["id"], "content": long }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .post(
                paths::CHAT_SEND,
                Some(&app.token("stranger")),
                json!({ "workspace_id": ws["id"], "content": "hello?" }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
