use crate::models::DbRecurringBooking;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Optional fields of a status transition. `None` leaves the stored value
/// untouched, mirroring the partial-update shape the processor needs.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub last_booked_date: Option<NaiveDate>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub retry_count: Option<i32>,
}

pub async fn add_recurring_booking(
    pool: &Pool<Postgres>,
    username: &str,
    class_name: &str,
    target_time: NaiveTime,
    day_of_week: &str,
    instructor: Option<&str>,
) -> Result<DbRecurringBooking> {
    tracing::debug!(
        "Creating recurring booking: user={}, class={}, day={}",
        username, class_name, day_of_week
    );

    let booking = sqlx::query_as::<_, DbRecurringBooking>(
        r#"
        INSERT INTO recurring_bookings (username, class_name, target_time, day_of_week, instructor, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(class_name)
    .bind(target_time)
    .bind(day_of_week)
    .bind(instructor)
    .fetch_one(pool)
    .await?;

    Ok(booking)
}

/// All records currently eligible for processing.
pub async fn get_pending_bookings(pool: &Pool<Postgres>) -> Result<Vec<DbRecurringBooking>> {
    let bookings = sqlx::query_as::<_, DbRecurringBooking>(
        "SELECT * FROM recurring_bookings WHERE status = 'pending' ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

/// Records holding the lock; the processor decides which are stale.
pub async fn get_in_progress_bookings(pool: &Pool<Postgres>) -> Result<Vec<DbRecurringBooking>> {
    let bookings = sqlx::query_as::<_, DbRecurringBooking>(
        "SELECT * FROM recurring_bookings WHERE status = 'in_progress'",
    )
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

pub async fn get_booking_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbRecurringBooking>> {
    let booking = sqlx::query_as::<_, DbRecurringBooking>(
        "SELECT * FROM recurring_bookings WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

/// Atomic conditional lock: `pending -> in_progress`, conditioned on the
/// current status still being `pending`. Returns false when another worker
/// already claimed the record.
pub async fn lock_booking(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE recurring_bookings
        SET status = 'in_progress'
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Partial status transition: only fields present in `update` change.
pub async fn update_booking_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
    update: &StatusUpdate,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE recurring_bookings
        SET status = $2,
            last_booked_date = COALESCE($3, last_booked_date),
            last_attempt_at = COALESCE($4, last_attempt_at),
            retry_count = COALESCE($5, retry_count)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(update.last_booked_date)
    .bind(update.last_attempt_at)
    .bind(update.retry_count)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_bookings_for_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Vec<DbRecurringBooking>> {
    let bookings = sqlx::query_as::<_, DbRecurringBooking>(
        "SELECT * FROM recurring_bookings WHERE username = $1 ORDER BY created_at",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

pub async fn cancel_booking(pool: &Pool<Postgres>, id: Uuid, username: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM recurring_bookings WHERE id = $1 AND username = $2")
        .bind(id)
        .bind(username)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Daily reclaim: exhausted records whose last attempt is older than the
/// cutoff go back to `pending` with a cleared retry counter.
pub async fn reset_failed_older_than(
    pool: &Pool<Postgres>,
    cutoff: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE recurring_bookings
        SET status = 'pending', retry_count = 0
        WHERE status = 'failed'
          AND (last_attempt_at IS NULL OR last_attempt_at < $1)
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Daily reclaim companion: any record still holding the lock at this point
/// belongs to a worker long gone.
pub async fn reset_lingering_in_progress(pool: &Pool<Postgres>) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE recurring_bookings SET status = 'pending', retry_count = 0 WHERE status = 'in_progress'",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
