use chrono::Utc;
use entities::{Document, DocumentPatch};
use sqlx::PgPool;
use uuid::Uuid;

use super::rows::{DocumentRow, DOCUMENT_COLUMNS};
use crate::{StoreError, StoreResult};

pub(super) async fn create(pool: &PgPool, document: Document) -> StoreResult<Document> {
    let row: DocumentRow = sqlx::query_as(&format!(
        "INSERT INTO documents
             (id, workspace_id, title, content, created_by_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {DOCUMENT_COLUMNS}"
    ))
    .bind(document.id)
    .bind(document.workspace_id)
    .bind(&document.title)
    .bind(&document.content)
    .bind(document.created_by_id)
    .bind(document.created_at)
    .bind(document.updated_at)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

pub(super) async fn get(pool: &PgPool, id: Uuid) -> StoreResult<Option<Document>> {
    let row: Option<DocumentRow> = sqlx::query_as(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Document::from))
}

pub(super) async fn list(pool: &PgPool, workspace_id: Uuid) -> StoreResult<Vec<Document>> {
    let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE workspace_id = $1
         ORDER BY updated_at DESC"
    ))
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Document::from).collect())
}

pub(super) async fn update(pool: &PgPool, id: Uuid, patch: DocumentPatch) -> StoreResult<Document> {
    let row: Option<DocumentRow> = sqlx::query_as(&format!(
        "UPDATE documents SET
             title = COALESCE($1, title),
             content = COALESCE($2, content),
             updated_at = $3
         WHERE id = $4
         RETURNING {DOCUMENT_COLUMNS}"
    ))
    .bind(patch.title)
    .bind(patch.content)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(Document::from)
        .ok_or_else(|| StoreError::not_found("Document", id))
}

pub(super) async fn delete(pool: &PgPool, id: Uuid) -> StoreResult<()> {
    let deleted = sqlx::query("DELETE FROM documents WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(StoreError::not_found("Document", id));
    }
    Ok(())
}
