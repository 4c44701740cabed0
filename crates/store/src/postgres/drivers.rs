use chrono::Utc;
use entities::{Driver, DriverProfile, GeoPoint, Rating};
use pagination::{Cursor, Page, PageRequest};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{
    keyset,
    rows::{DriverRow, DRIVER_COLUMNS},
};
use crate::{StoreError, StoreResult};

pub(super) async fn register(
    pool: &PgPool,
    user_id: Uuid,
    profile: DriverProfile,
) -> StoreResult<Driver> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let promoted = sqlx::query("UPDATE users SET role = 'driver', updated_at = $1 WHERE id = $2")
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if promoted == 0 {
        return Err(StoreError::not_found("User", user_id));
    }

    let driver = Driver::new(user_id, profile);
    let row: DriverRow = sqlx::query_as(&format!(
        "INSERT INTO drivers
             (id, user_id, license_number, vehicle_model, vehicle_color, vehicle_plate,
              is_available, rating, total_rides, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         ON CONFLICT (user_id) DO UPDATE SET
             license_number = EXCLUDED.license_number,
             vehicle_model = EXCLUDED.vehicle_model,
             vehicle_color = EXCLUDED.vehicle_color,
             vehicle_plate = EXCLUDED.vehicle_plate,
             updated_at = EXCLUDED.updated_at
         RETURNING {DRIVER_COLUMNS}"
    ))
    .bind(driver.id)
    .bind(driver.user_id)
    .bind(&driver.license_number)
    .bind(&driver.vehicle_model)
    .bind(&driver.vehicle_color)
    .bind(&driver.vehicle_plate)
    .bind(driver.is_available)
    .bind(driver.rating)
    .bind(driver.total_rides)
    .bind(driver.created_at)
    .bind(driver.updated_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row.into())
}

pub(super) async fn get(pool: &PgPool, id: Uuid) -> StoreResult<Option<Driver>> {
    let row: Option<DriverRow> =
        sqlx::query_as(&format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Driver::from))
}

pub(super) async fn get_by_user(pool: &PgPool, user_id: Uuid) -> StoreResult<Option<Driver>> {
    let row: Option<DriverRow> = sqlx::query_as(&format!(
        "SELECT {DRIVER_COLUMNS} FROM drivers WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Driver::from))
}

pub(super) async fn set_availability(
    pool: &PgPool,
    driver_id: Uuid,
    available: bool,
) -> StoreResult<Driver> {
    let row: Option<DriverRow> = sqlx::query_as(&format!(
        "UPDATE drivers SET is_available = $1, updated_at = $2
         WHERE id = $3
           AND (NOT $1 OR NOT EXISTS (
               SELECT 1 FROM rides
               WHERE driver_id = $3 AND status IN ('accepted', 'in_progress')
           ))
         RETURNING {DRIVER_COLUMNS}"
    ))
    .bind(available)
    .bind(Utc::now())
    .bind(driver_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(row.into()),
        None if get(pool, driver_id).await?.is_some() => Err(StoreError::conflict(
            "driver has an active ride and cannot become available",
        )),
        None => Err(StoreError::not_found("Driver", driver_id)),
    }
}

pub(super) async fn update_location(
    pool: &PgPool,
    driver_id: Uuid,
    location: GeoPoint,
) -> StoreResult<Driver> {
    let row: Option<DriverRow> = sqlx::query_as(&format!(
        "UPDATE drivers SET current_lat = $1, current_lng = $2, updated_at = $3
         WHERE id = $4
         RETURNING {DRIVER_COLUMNS}"
    ))
    .bind(location.lat)
    .bind(location.lng)
    .bind(Utc::now())
    .bind(driver_id)
    .fetch_optional(pool)
    .await?;
    row.map(Driver::from)
        .ok_or_else(|| StoreError::not_found("Driver", driver_id))
}

pub(super) async fn list_available(pool: &PgPool, page: &PageRequest) -> StoreResult<Page<Driver>> {
    let (after_time, after_id) = keyset(page);
    let rows: Vec<DriverRow> = sqlx::query_as(&format!(
        "SELECT {DRIVER_COLUMNS} FROM drivers
         WHERE is_available
           AND ($1::timestamptz IS NULL OR (created_at, id) > ($1, $2))
         ORDER BY created_at, id
         LIMIT $3"
    ))
    .bind(after_time)
    .bind(after_id)
    .bind(page.fetch_limit())
    .fetch_all(pool)
    .await?;

    let drivers = rows.into_iter().map(Driver::from).collect();
    Ok(Page::from_overfetch(drivers, page, |d: &Driver| {
        Cursor::new(d.created_at, d.id)
    }))
}

/// Takes a driver off the market if currently available. Returns false when
/// the driver is missing or already busy.
pub(super) async fn claim(conn: &mut PgConnection, driver_id: Uuid) -> StoreResult<bool> {
    let claimed = sqlx::query(
        "UPDATE drivers SET is_available = FALSE, updated_at = $1
         WHERE id = $2 AND is_available",
    )
    .bind(Utc::now())
    .bind(driver_id)
    .execute(conn)
    .await?
    .rows_affected();
    Ok(claimed == 1)
}

/// Puts a driver back on the market.
pub(super) async fn release(conn: &mut PgConnection, driver_id: Uuid) -> StoreResult<()> {
    sqlx::query("UPDATE drivers SET is_available = TRUE, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(driver_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Folds a rating into the driver's aggregate while holding the row lock.
pub(super) async fn record_rating(
    conn: &mut PgConnection,
    driver_id: Uuid,
    rating: Rating,
) -> StoreResult<()> {
    let row: Option<DriverRow> = sqlx::query_as(&format!(
        "SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1 FOR UPDATE"
    ))
    .bind(driver_id)
    .fetch_optional(&mut *conn)
    .await?;
    let mut driver = row
        .map(Driver::from)
        .ok_or_else(|| StoreError::not_found("Driver", driver_id))?;

    driver.record_rating(rating);
    sqlx::query("UPDATE drivers SET rating = $1, total_rides = $2, updated_at = $3 WHERE id = $4")
        .bind(driver.rating)
        .bind(driver.total_rides)
        .bind(Utc::now())
        .bind(driver_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
