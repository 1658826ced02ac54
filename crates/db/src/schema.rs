use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create recurring_bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recurring_bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username VARCHAR(255) NOT NULL,
            class_name VARCHAR(255) NOT NULL,
            target_time TIME NOT NULL,
            day_of_week VARCHAR(16) NOT NULL,
            instructor VARCHAR(255) NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            last_attempt_at TIMESTAMP WITH TIME ZONE NULL,
            retry_count INTEGER NOT NULL DEFAULT 0,
            last_booked_date DATE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create live_bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS live_bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username VARCHAR(255) NOT NULL,
            class_name VARCHAR(255) NOT NULL,
            class_date DATE NOT NULL,
            class_time TIME NOT NULL,
            instructor VARCHAR(255) NULL,
            recurring_booking_id UUID NULL REFERENCES recurring_bookings(id) ON DELETE SET NULL,
            reminder_sent BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create sessions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            username VARCHAR(255) PRIMARY KEY,
            sealed_password TEXT NOT NULL,
            session_blob TEXT NOT NULL,
            last_used_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create push_subscriptions table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS push_subscriptions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username VARCHAR(255) NOT NULL,
            endpoint TEXT NOT NULL UNIQUE,
            p256dh_key TEXT NOT NULL,
            auth_key TEXT NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes. The unique expression index on live_bookings backs the
    // reconciler's case-insensitive natural key and the upsert conflict target.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_live_bookings_natural_key
            ON live_bookings (username, class_date, class_time, LOWER(class_name));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_recurring_bookings_status ON recurring_bookings(status);
        CREATE INDEX IF NOT EXISTS idx_recurring_bookings_username ON recurring_bookings(username);
        CREATE INDEX IF NOT EXISTS idx_live_bookings_username ON live_bookings(username);
        CREATE INDEX IF NOT EXISTS idx_live_bookings_reminder ON live_bookings(reminder_sent) WHERE NOT reminder_sent;
        CREATE INDEX IF NOT EXISTS idx_push_subscriptions_username ON push_subscriptions(username);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
