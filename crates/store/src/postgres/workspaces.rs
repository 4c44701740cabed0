use entities::{MemberRole, Workspace, WorkspaceMember};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    is_foreign_key_violation, is_unique_violation,
    rows::{convert_all, MemberRow, MemberUserRow, WorkspaceRow, MEMBER_COLUMNS, WORKSPACE_COLUMNS},
};
use crate::{MemberWithUser, StoreError, StoreResult};

pub(super) async fn create(pool: &PgPool, workspace: Workspace) -> StoreResult<Workspace> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO workspaces (id, name, description, owner_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(workspace.id)
    .bind(&workspace.name)
    .bind(&workspace.description)
    .bind(workspace.owner_id)
    .bind(workspace.created_at)
    .bind(workspace.updated_at)
    .execute(&mut *tx)
    .await?;

    let owner = WorkspaceMember::new(workspace.id, workspace.owner_id, MemberRole::Owner);
    sqlx::query(
        "INSERT INTO workspace_members (id, workspace_id, user_id, role, joined_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(owner.id)
    .bind(owner.workspace_id)
    .bind(owner.user_id)
    .bind(owner.role.as_str())
    .bind(owner.joined_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(workspace)
}

pub(super) async fn get(pool: &PgPool, id: Uuid) -> StoreResult<Option<Workspace>> {
    let row: Option<WorkspaceRow> = sqlx::query_as(&format!(
        "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Workspace::from))
}

pub(super) async fn list_for_user(pool: &PgPool, user_id: Uuid) -> StoreResult<Vec<Workspace>> {
    let rows: Vec<WorkspaceRow> = sqlx::query_as(
        "SELECT w.id, w.name, w.description, w.owner_id, w.created_at, w.updated_at
         FROM workspaces w
         JOIN workspace_members m ON m.workspace_id = w.id
         WHERE m.user_id = $1
         ORDER BY w.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Workspace::from).collect())
}

pub(super) async fn add_member(
    pool: &PgPool,
    member: WorkspaceMember,
) -> StoreResult<WorkspaceMember> {
    sqlx::query(
        "INSERT INTO workspace_members (id, workspace_id, user_id, role, joined_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(member.id)
    .bind(member.workspace_id)
    .bind(member.user_id)
    .bind(member.role.as_str())
    .bind(member.joined_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::already_exists("WorkspaceMember", member.user_id)
        } else if is_foreign_key_violation(&e) {
            StoreError::not_found("Workspace", member.workspace_id)
        } else {
            e.into()
        }
    })?;
    Ok(member)
}

pub(super) async fn get_member(
    pool: &PgPool,
    workspace_id: Uuid,
    user_id: Uuid,
) -> StoreResult<Option<WorkspaceMember>> {
    let row: Option<MemberRow> = sqlx::query_as(&format!(
        "SELECT {MEMBER_COLUMNS} FROM workspace_members WHERE workspace_id = $1 AND user_id = $2"
    ))
    .bind(workspace_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    row.map(WorkspaceMember::try_from).transpose()
}

pub(super) async fn list_members(
    pool: &PgPool,
    workspace_id: Uuid,
) -> StoreResult<Vec<MemberWithUser>> {
    let rows: Vec<MemberUserRow> = sqlx::query_as(
        "SELECT m.id, m.workspace_id, m.user_id, m.role, m.joined_at,
                u.external_id AS user_external_id, u.email AS user_email,
                u.name AS user_name, u.role AS user_role, u.phone AS user_phone,
                u.avatar_url AS user_avatar_url, u.created_at AS user_created_at,
                u.updated_at AS user_updated_at
         FROM workspace_members m
         JOIN users u ON u.id = m.user_id
         WHERE m.workspace_id = $1
         ORDER BY m.joined_at",
    )
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;
    convert_all(rows)
}
