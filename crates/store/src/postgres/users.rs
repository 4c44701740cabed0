use chrono::Utc;
use entities::User;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    is_unique_violation,
    rows::{UserRow, USER_COLUMNS},
};
use crate::{StoreError, StoreResult};

pub(super) async fn ensure(pool: &PgPool, user: User) -> StoreResult<User> {
    sqlx::query(
        "INSERT INTO users
             (id, external_id, email, name, role, phone, avatar_url, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (external_id) DO NOTHING",
    )
    .bind(user.id)
    .bind(&user.external_id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.role.as_str())
    .bind(&user.phone)
    .bind(&user.avatar_url)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::already_exists("User", &user.email)
        } else {
            e.into()
        }
    })?;

    get_by_external_id(pool, &user.external_id)
        .await?
        .ok_or_else(|| StoreError::not_found("User", &user.external_id))
}

pub(super) async fn get_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> StoreResult<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;
    row.map(User::try_from).transpose()
}

pub(super) async fn get_by_email(pool: &PgPool, email: &str) -> StoreResult<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await?;
    row.map(User::try_from).transpose()
}

pub(super) async fn update_phone(
    pool: &PgPool,
    id: Uuid,
    phone: Option<String>,
) -> StoreResult<User> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "UPDATE users SET phone = $1, updated_at = $2 WHERE id = $3 RETURNING {USER_COLUMNS}"
    ))
    .bind(phone)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| StoreError::not_found("User", id))?
        .try_into()
}
