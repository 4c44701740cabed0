use chrono::Utc;
use entities::{Ride, RideStatus};
use pagination::{Cursor, Page, PageRequest};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{
    drivers, keyset,
    rows::{convert_all, RideRow, RIDE_COLUMNS},
};
use crate::{StoreError, StoreResult};

fn ride_position(ride: &Ride) -> Cursor {
    Cursor::new(ride.created_at, ride.id)
}

pub(super) async fn create(pool: &PgPool, ride: Ride) -> StoreResult<Ride> {
    let row: RideRow = sqlx::query_as(&format!(
        "INSERT INTO rides
             (id, rider_id, driver_id, pickup_lat, pickup_lng, pickup_address,
              dropoff_lat, dropoff_lng, dropoff_address, status, fare, distance_km,
              duration_minutes, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         RETURNING {RIDE_COLUMNS}"
    ))
    .bind(ride.id)
    .bind(ride.rider_id)
    .bind(ride.driver_id)
    .bind(ride.pickup.lat)
    .bind(ride.pickup.lng)
    .bind(&ride.pickup.address)
    .bind(ride.dropoff.lat)
    .bind(ride.dropoff.lng)
    .bind(&ride.dropoff.address)
    .bind(ride.status.as_str())
    .bind(ride.fare)
    .bind(ride.distance_km)
    .bind(ride.duration_minutes)
    .bind(ride.created_at)
    .bind(ride.updated_at)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

pub(super) async fn get(pool: &PgPool, id: Uuid) -> StoreResult<Option<Ride>> {
    let row: Option<RideRow> =
        sqlx::query_as(&format!("SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.map(Ride::try_from).transpose()
}

pub(super) async fn list_for_rider(
    pool: &PgPool,
    rider_id: Uuid,
    page: &PageRequest,
) -> StoreResult<Page<Ride>> {
    let (after_time, after_id) = keyset(page);
    let rows: Vec<RideRow> = sqlx::query_as(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides
         WHERE rider_id = $1
           AND ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
         ORDER BY created_at DESC, id DESC
         LIMIT $4"
    ))
    .bind(rider_id)
    .bind(after_time)
    .bind(after_id)
    .bind(page.fetch_limit())
    .fetch_all(pool)
    .await?;
    Ok(Page::from_overfetch(convert_all(rows)?, page, ride_position))
}

pub(super) async fn list_for_driver(
    pool: &PgPool,
    driver_id: Uuid,
    page: &PageRequest,
) -> StoreResult<Page<Ride>> {
    let (after_time, after_id) = keyset(page);
    let rows: Vec<RideRow> = sqlx::query_as(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides
         WHERE driver_id = $1
           AND ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3))
         ORDER BY created_at DESC, id DESC
         LIMIT $4"
    ))
    .bind(driver_id)
    .bind(after_time)
    .bind(after_id)
    .bind(page.fetch_limit())
    .fetch_all(pool)
    .await?;
    Ok(Page::from_overfetch(convert_all(rows)?, page, ride_position))
}

pub(super) async fn list_pending(pool: &PgPool, page: &PageRequest) -> StoreResult<Page<Ride>> {
    let (after_time, after_id) = keyset(page);
    let rows: Vec<RideRow> = sqlx::query_as(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides
         WHERE status = 'pending'
           AND ($1::timestamptz IS NULL OR (created_at, id) > ($1, $2))
         ORDER BY created_at, id
         LIMIT $3"
    ))
    .bind(after_time)
    .bind(after_id)
    .bind(page.fetch_limit())
    .fetch_all(pool)
    .await?;
    Ok(Page::from_overfetch(convert_all(rows)?, page, ride_position))
}

/// Explains why a conditional ride update matched no row.
///
/// A ride that is missing, or that `visible` hides from the caller, is not
/// found; otherwise its current status did not permit the step.
async fn transition_error(
    pool: &PgPool,
    ride_id: Uuid,
    to: RideStatus,
    visible: impl Fn(&Ride) -> bool,
) -> StoreError {
    match get(pool, ride_id).await {
        Ok(Some(ride)) if visible(&ride) => {
            warn!(ride_id = %ride_id, from = %ride.status, to = %to, "Rejected ride transition");
            StoreError::InvalidStateTransition {
                from: ride.status,
                to,
            }
        }
        Ok(_) => StoreError::not_found("Ride", ride_id),
        Err(err) => err,
    }
}

pub(super) async fn accept(pool: &PgPool, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
    let mut tx = pool.begin().await?;

    if !drivers::claim(&mut tx, driver_id).await? {
        tx.rollback().await?;
        return match drivers::get(pool, driver_id).await? {
            Some(_) => Err(StoreError::conflict("driver is not available")),
            None => Err(StoreError::not_found("Driver", driver_id)),
        };
    }

    let row: Option<RideRow> = sqlx::query_as(&format!(
        "UPDATE rides SET driver_id = $1, status = 'accepted', updated_at = $2
         WHERE id = $3 AND status = 'pending'
         RETURNING {RIDE_COLUMNS}"
    ))
    .bind(driver_id)
    .bind(Utc::now())
    .bind(ride_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Err(transition_error(pool, ride_id, RideStatus::Accepted, |_| true).await);
    };

    tx.commit().await?;
    row.try_into()
}

/// Advances a ride bound to `driver_id` from `from` to `to`.
async fn advance(
    pool: &PgPool,
    ride_id: Uuid,
    driver_id: Uuid,
    from: RideStatus,
    to: RideStatus,
) -> StoreResult<Ride> {
    let row: Option<RideRow> = sqlx::query_as(&format!(
        "UPDATE rides SET status = $1, updated_at = $2
         WHERE id = $3 AND status = $4 AND driver_id = $5
         RETURNING {RIDE_COLUMNS}"
    ))
    .bind(to.as_str())
    .bind(Utc::now())
    .bind(ride_id)
    .bind(from.as_str())
    .bind(driver_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Err(transition_error(pool, ride_id, to, |ride| {
            ride.driver_id.is_none_or(|d| d == driver_id)
        })
        .await),
    }
}

pub(super) async fn start(pool: &PgPool, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
    advance(pool, ride_id, driver_id, RideStatus::Accepted, RideStatus::InProgress).await
}

pub(super) async fn complete(pool: &PgPool, ride_id: Uuid, driver_id: Uuid) -> StoreResult<Ride> {
    advance(pool, ride_id, driver_id, RideStatus::InProgress, RideStatus::Completed).await
}

pub(super) async fn cancel(pool: &PgPool, ride_id: Uuid, rider_id: Uuid) -> StoreResult<Ride> {
    let mut tx = pool.begin().await?;

    let row: Option<RideRow> = sqlx::query_as(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 AND rider_id = $2 FOR UPDATE"
    ))
    .bind(ride_id)
    .bind(rider_id)
    .fetch_optional(&mut *tx)
    .await?;
    let mut ride: Ride = row
        .ok_or_else(|| StoreError::not_found("Ride", ride_id))?
        .try_into()?;

    let released = ride.cancel()?;
    sqlx::query("UPDATE rides SET status = $1, driver_id = NULL, updated_at = $2 WHERE id = $3")
        .bind(ride.status.as_str())
        .bind(ride.updated_at)
        .bind(ride_id)
        .execute(&mut *tx)
        .await?;
    if let Some(driver_id) = released {
        drivers::release(&mut tx, driver_id).await?;
    }

    tx.commit().await?;
    Ok(ride)
}
