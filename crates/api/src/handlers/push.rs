//! # Push Subscription Handlers
//!
//! Stores browser push subscriptions consumed by the scheduler's
//! cancellation-reminder job. Delivery itself happens behind the scheduler's
//! notifier trait.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::{
    middleware::{auth::AuthUser, error_handling::AppError},
    ApiState,
};
use rebook_core::errors::BookingError;
use rebook_core::models::subscription::SubscribeRequest;
use rebook_db::repositories::subscription;

pub async fn subscribe(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.endpoint.is_empty() {
        return Err(AppError(BookingError::Validation(
            "endpoint must not be empty".to_string(),
        )));
    }

    subscription::save_subscription(
        &state.db_pool,
        &user.username,
        &request.endpoint,
        &request.p256dh_key,
        &request.auth_key,
    )
    .await?;

    info!("Saved push subscription for {}", user.username);
    Ok(Json(serde_json::json!({ "message": "Subscribed" })))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

pub async fn unsubscribe(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Json(request): Json<UnsubscribeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted =
        subscription::delete_subscription_by_endpoint(&state.db_pool, &request.endpoint).await?;
    if !deleted {
        return Err(AppError(BookingError::NotFound(
            "Subscription not found".to_string(),
        )));
    }

    info!("Removed push subscription for {}", user.username);
    Ok(Json(serde_json::json!({ "message": "Unsubscribed" })))
}
