use crate::models::DbSession;
use eyre::Result;
use sqlx::{Pool, Postgres};

/// Persist (or replace) a user's sealed credential and session blob. Called
/// after every successful login so the stored cookies stay fresh.
pub async fn save_session(
    pool: &Pool<Postgres>,
    username: &str,
    sealed_password: &str,
    session_blob: &str,
) -> Result<()> {
    tracing::debug!("Saving session for user={}", username);

    sqlx::query(
        r#"
        INSERT INTO sessions (username, sealed_password, session_blob, last_used_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (username) DO UPDATE
        SET sealed_password = EXCLUDED.sealed_password,
            session_blob = EXCLUDED.session_blob,
            last_used_at = NOW()
        "#,
    )
    .bind(username)
    .bind(sealed_password)
    .bind(session_blob)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_session(pool: &Pool<Postgres>, username: &str) -> Result<Option<DbSession>> {
    let session = sqlx::query_as::<_, DbSession>("SELECT * FROM sessions WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(session)
}

pub async fn touch_session(pool: &Pool<Postgres>, username: &str) -> Result<()> {
    sqlx::query("UPDATE sessions SET last_used_at = NOW() WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_session(pool: &Pool<Postgres>, username: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Every username with a persisted session; the refresher's work list.
pub async fn list_session_usernames(pool: &Pool<Postgres>) -> Result<Vec<String>> {
    let usernames = sqlx::query_scalar::<_, String>("SELECT username FROM sessions ORDER BY username")
        .fetch_all(pool)
        .await?;

    Ok(usernames)
}
