use crate::models::DbPushSubscription;
use eyre::Result;
use sqlx::{Pool, Postgres};

pub async fn save_subscription(
    pool: &Pool<Postgres>,
    username: &str,
    endpoint: &str,
    p256dh_key: &str,
    auth_key: &str,
) -> Result<DbPushSubscription> {
    let subscription = sqlx::query_as::<_, DbPushSubscription>(
        r#"
        INSERT INTO push_subscriptions (username, endpoint, p256dh_key, auth_key)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (endpoint) DO UPDATE
        SET username = EXCLUDED.username,
            p256dh_key = EXCLUDED.p256dh_key,
            auth_key = EXCLUDED.auth_key
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(endpoint)
    .bind(p256dh_key)
    .bind(auth_key)
    .fetch_one(pool)
    .await?;

    Ok(subscription)
}

pub async fn list_subscriptions_for_user(
    pool: &Pool<Postgres>,
    username: &str,
) -> Result<Vec<DbPushSubscription>> {
    let subscriptions = sqlx::query_as::<_, DbPushSubscription>(
        "SELECT * FROM push_subscriptions WHERE username = $1",
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    Ok(subscriptions)
}

/// Remove a dead endpoint, e.g. after the push service reports it gone.
pub async fn delete_subscription_by_endpoint(
    pool: &Pool<Postgres>,
    endpoint: &str,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
        .bind(endpoint)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
