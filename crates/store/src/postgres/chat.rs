use chrono::{DateTime, Utc};
use entities::{Message, MessageWithAuthor};
use pagination::{Cursor, Page, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use super::{keyset, rows::MessageRow};
use crate::{StoreError, StoreResult};

pub(super) async fn create(pool: &PgPool, mut message: Message) -> StoreResult<MessageWithAuthor> {
    let mut tx = pool.begin().await?;

    // Serializes posts to the same workspace so stamps follow commit order.
    sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
        .bind(message.workspace_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Workspace", message.workspace_id))?;

    let latest: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(created_at) FROM messages WHERE workspace_id = $1")
            .bind(message.workspace_id)
            .fetch_one(&mut *tx)
            .await?;
    message.stamp_after(latest);

    let row: MessageRow = sqlx::query_as(
        "WITH inserted AS (
             INSERT INTO messages (id, workspace_id, user_id, content, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, workspace_id, user_id, content, created_at
         )
         SELECT m.id, m.workspace_id, m.user_id, m.content, m.created_at,
                COALESCE(NULLIF(u.name, ''), u.email) AS user_name
         FROM inserted m
         JOIN users u ON u.id = m.user_id",
    )
    .bind(message.id)
    .bind(message.workspace_id)
    .bind(message.user_id)
    .bind(&message.content)
    .bind(message.created_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row.into())
}

pub(super) async fn list(
    pool: &PgPool,
    workspace_id: Uuid,
    page: &PageRequest,
) -> StoreResult<Page<MessageWithAuthor>> {
    let (after_time, after_id) = keyset(page);
    let rows: Vec<MessageRow> = sqlx::query_as(
        "SELECT m.id, m.workspace_id, m.user_id, m.content, m.created_at,
                COALESCE(NULLIF(u.name, ''), u.email) AS user_name
         FROM messages m
         JOIN users u ON u.id = m.user_id
         WHERE m.workspace_id = $1
           AND ($2::timestamptz IS NULL OR (m.created_at, m.id) > ($2, $3))
         ORDER BY m.created_at, m.id
         LIMIT $4",
    )
    .bind(workspace_id)
    .bind(after_time)
    .bind(after_id)
    .bind(page.fetch_limit())
    .fetch_all(pool)
    .await?;

    let messages = rows.into_iter().map(MessageWithAuthor::from).collect();
    Ok(Page::from_overfetch(
        messages,
        page,
        |m: &MessageWithAuthor| Cursor::new(m.message.created_at, m.message.id),
    ))
}
