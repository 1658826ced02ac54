use crate::models::DbLiveBooking;
use chrono::{NaiveDate, NaiveTime};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Insert or refresh a cached live booking. Conflicts on the
/// case-insensitive natural key (username, date, time, name); an existing
/// row keeps its id and back-reference unless the new write carries one.
pub async fn upsert_live_booking(
    pool: &Pool<Postgres>,
    username: &str,
    class_name: &str,
    class_date: NaiveDate,
    class_time: NaiveTime,
    instructor: Option<&str>,
    recurring_booking_id: Option<Uuid>,
) -> Result<DbLiveBooking> {
    tracing::debug!(
        "Upserting live booking: user={}, class={}, date={}",
        username, class_name, class_date
    );

    let booking = sqlx::query_as::<_, DbLiveBooking>(
        r#"
        INSERT INTO live_bookings (username, class_name, class_date, class_time, instructor, recurring_booking_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (username, class_date, class_time, LOWER(class_name)) DO UPDATE
        SET class_name = EXCLUDED.class_name,
            instructor = COALESCE(EXCLUDED.instructor, live_bookings.instructor),
            recurring_booking_id = COALESCE(EXCLUDED.recurring_booking_id, live_bookings.recurring_booking_id)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(class_name)
    .bind(class_date)
    .bind(class_time)
    .bind(instructor)
    .bind(recurring_booking_id)
    .fetch_one(pool)
    .await?;

    Ok(booking)
}

/// In-place rename for the reconciler's casing updates. The row id and any
/// back-reference survive.
pub async fn rename_live_booking(pool: &Pool<Postgres>, id: Uuid, new_name: &str) -> Result<()> {
    sqlx::query("UPDATE live_bookings SET class_name = $2 WHERE id = $1")
        .bind(id)
        .bind(new_name)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_live_booking(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM live_bookings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_live_bookings_for_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Vec<DbLiveBooking>> {
    let bookings = sqlx::query_as::<_, DbLiveBooking>(
        "SELECT * FROM live_bookings WHERE username = $1 ORDER BY class_date, class_time",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

/// Live bookings that have not had a cancellation reminder yet. The reminder
/// job applies the time-window filter.
pub async fn get_unsent_reminder_bookings(pool: &Pool<Postgres>) -> Result<Vec<DbLiveBooking>> {
    let bookings = sqlx::query_as::<_, DbLiveBooking>(
        "SELECT * FROM live_bookings WHERE NOT reminder_sent",
    )
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

pub async fn mark_reminder_sent(pool: &Pool<Postgres>, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE live_bookings SET reminder_sent = TRUE WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
