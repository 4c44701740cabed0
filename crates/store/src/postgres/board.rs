use std::collections::HashSet;

use entities::{BoardTask, TaskPatch, TaskStatus};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::rows::{convert_all, BoardTaskRow, TASK_COLUMNS};
use crate::{StoreError, StoreResult};

/// Position just past the last task of a column.
async fn next_position(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    status: TaskStatus,
    excluding: Uuid,
) -> StoreResult<i32> {
    let position: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM board_tasks
         WHERE workspace_id = $1 AND status = $2 AND id <> $3",
    )
    .bind(workspace_id)
    .bind(status.as_str())
    .bind(excluding)
    .fetch_one(conn)
    .await?;
    Ok(position)
}

pub(super) async fn create(pool: &PgPool, mut task: BoardTask) -> StoreResult<BoardTask> {
    let mut tx = pool.begin().await?;

    // Serializes appends to the same board.
    sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
        .bind(task.workspace_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Workspace", task.workspace_id))?;

    task.position = next_position(&mut tx, task.workspace_id, task.status, task.id).await?;
    let row: BoardTaskRow = sqlx::query_as(&format!(
        "INSERT INTO board_tasks
             (id, workspace_id, title, description, status, priority, assignee_id,
              created_by_id, due_date, position, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(task.id)
    .bind(task.workspace_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(task.assignee_id)
    .bind(task.created_by_id)
    .bind(task.due_date)
    .bind(task.position)
    .bind(task.created_at)
    .bind(task.updated_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    row.try_into()
}

pub(super) async fn get(pool: &PgPool, id: Uuid) -> StoreResult<Option<BoardTask>> {
    let row: Option<BoardTaskRow> = sqlx::query_as(&format!(
        "SELECT {TASK_COLUMNS} FROM board_tasks WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(BoardTask::try_from).transpose()
}

pub(super) async fn update(pool: &PgPool, id: Uuid, patch: TaskPatch) -> StoreResult<BoardTask> {
    let mut tx = pool.begin().await?;

    let row: Option<BoardTaskRow> = sqlx::query_as(&format!(
        "SELECT {TASK_COLUMNS} FROM board_tasks WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let mut task: BoardTask = row
        .ok_or_else(|| StoreError::not_found("BoardTask", id))?
        .try_into()?;

    if task.apply(patch) {
        task.position = next_position(&mut tx, task.workspace_id, task.status, task.id).await?;
    }

    let row: BoardTaskRow = sqlx::query_as(&format!(
        "UPDATE board_tasks SET
             title = $1, description = $2, status = $3, priority = $4,
             assignee_id = $5, due_date = $6, position = $7, updated_at = $8
         WHERE id = $9
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status.as_str())
    .bind(task.priority.as_str())
    .bind(task.assignee_id)
    .bind(task.due_date)
    .bind(task.position)
    .bind(task.updated_at)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    row.try_into()
}

pub(super) async fn reorder(
    pool: &PgPool,
    workspace_id: Uuid,
    status: TaskStatus,
    task_ids: &[Uuid],
) -> StoreResult<Vec<BoardTask>> {
    let mut seen = HashSet::new();
    if let Some(dup) = task_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(StoreError::validation(format!("task {dup} listed twice")));
    }

    let mut tx = pool.begin().await?;
    let moved = sqlx::query(
        "UPDATE board_tasks t
         SET status = $1, position = (o.ord - 1)::int, updated_at = now()
         FROM unnest($2::uuid[]) WITH ORDINALITY AS o(id, ord)
         WHERE t.id = o.id AND t.workspace_id = $3",
    )
    .bind(status.as_str())
    .bind(task_ids)
    .bind(workspace_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if moved != task_ids.len() as u64 {
        tx.rollback().await?;
        return Err(StoreError::validation(
            "every task must belong to this board",
        ));
    }

    tx.commit().await?;
    list(pool, workspace_id).await
}

pub(super) async fn list(pool: &PgPool, workspace_id: Uuid) -> StoreResult<Vec<BoardTask>> {
    let rows: Vec<BoardTaskRow> = sqlx::query_as(&format!(
        "SELECT {TASK_COLUMNS} FROM board_tasks
         WHERE workspace_id = $1
         ORDER BY
             CASE status WHEN 'todo' THEN 0 WHEN 'in_progress' THEN 1 ELSE 2 END,
             position, created_at"
    ))
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;
    convert_all(rows)
}

pub(super) async fn delete(pool: &PgPool, id: Uuid) -> StoreResult<()> {
    let deleted = sqlx::query("DELETE FROM board_tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(StoreError::not_found("BoardTask", id));
    }
    Ok(())
}
