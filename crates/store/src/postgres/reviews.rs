use entities::{Review, Ride, RideStatus};
use pagination::{Cursor, Page, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    drivers, keyset,
    rows::{convert_all, ReviewRow, RideRow, REVIEW_COLUMNS, RIDE_COLUMNS},
};
use crate::{ReviewSubmission, StoreError, StoreResult};

pub(super) async fn create(pool: &PgPool, submission: ReviewSubmission) -> StoreResult<Review> {
    let mut tx = pool.begin().await?;

    let row: Option<RideRow> = sqlx::query_as(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 AND rider_id = $2 FOR SHARE"
    ))
    .bind(submission.ride_id)
    .bind(submission.rider_id)
    .fetch_optional(&mut *tx)
    .await?;
    let ride: Ride = row
        .ok_or_else(|| StoreError::not_found("Ride", submission.ride_id))?
        .try_into()?;

    let driver_id = ride
        .driver_id
        .ok_or_else(|| StoreError::conflict("ride has no driver to review"))?;
    if ride.status != RideStatus::Completed {
        return Err(StoreError::conflict(format!(
            "only completed rides can be reviewed (ride is {})",
            ride.status
        )));
    }

    let mut review = Review::new(ride.id, ride.rider_id, driver_id, submission.rating);
    if let Some(comment) = submission.comment {
        review = review.with_comment(comment);
    }

    let inserted = sqlx::query(
        "INSERT INTO reviews (id, ride_id, rider_id, driver_id, rating, comment, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (ride_id) DO NOTHING",
    )
    .bind(review.id)
    .bind(review.ride_id)
    .bind(review.rider_id)
    .bind(review.driver_id)
    .bind(i16::from(review.rating.get()))
    .bind(&review.comment)
    .bind(review.created_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    if inserted == 0 {
        return Err(StoreError::already_exists("Review", ride.id));
    }

    drivers::record_rating(&mut tx, driver_id, submission.rating).await?;

    tx.commit().await?;
    Ok(review)
}

pub(super) async fn get_by_ride(pool: &PgPool, ride_id: Uuid) -> StoreResult<Option<Review>> {
    let row: Option<ReviewRow> = sqlx::query_as(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE ride_id = $1"
    ))
    .bind(ride_id)
    .fetch_optional(pool)
    .await?;
    row.map(Review::try_from).transpose()
}

pub(super) async fn list_for_driver(
    pool: &PgPool,
    driver_id: Uuid,
    page: &PageRequest,
) -> StoreResult<Page<Review>> {
    let (after_time, after_id) = keyset(page);
    let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews
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
    Ok(Page::from_overfetch(convert_all(rows)?, page, |r: &Review| {
        Cursor::new(r.created_at, r.id)
    }))
}
