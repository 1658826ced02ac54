//! # Recurring Booking Handlers
//!
//! CRUD over the user's weekly recurring booking definitions. The scheduler
//! owns every other mutation of these records; the API only creates them,
//! lists them with their current status and retry count, and deletes them on
//! explicit cancellation.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Weekday;
use tracing::info;
use uuid::Uuid;

use crate::{
    middleware::{auth::AuthUser, error_handling::AppError},
    ApiState,
};
use rebook_core::errors::BookingError;
use rebook_core::models::recurring::{CreateRecurringBookingRequest, RecurringBookingResponse};
use rebook_db::repositories::recurring;

pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Json(request): Json<CreateRecurringBookingRequest>,
) -> Result<Json<RecurringBookingResponse>, AppError> {
    if request.class_name.trim().is_empty() {
        return Err(AppError(BookingError::Validation(
            "class_name must not be empty".to_string(),
        )));
    }
    // Reject malformed day names up front; the scheduler would otherwise
    // fail the record terminally on its first cycle.
    let day: Weekday = request.day_of_week.parse().map_err(|_| {
        AppError(BookingError::Validation(format!(
            "Invalid day_of_week '{}'",
            request.day_of_week
        )))
    })?;

    let row = recurring::add_recurring_booking(
        &state.db_pool,
        &user.username,
        request.class_name.trim(),
        request.target_time,
        rebook_core::models::recurring::day_name(day),
        request.instructor.as_deref(),
    )
    .await?;

    info!(
        "Created recurring booking {} for {} ('{}' {} {})",
        row.id, user.username, row.class_name, row.day_of_week, row.target_time
    );

    let booking = row.into_domain().map_err(AppError)?;
    Ok(Json(booking.into()))
}

pub async fn list_bookings(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<RecurringBookingResponse>>, AppError> {
    let rows = recurring::list_bookings_for_user(&state.db_pool, &user.username).await?;

    let bookings = rows
        .into_iter()
        .map(|row| row.into_domain().map(RecurringBookingResponse::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError)?;

    Ok(Json(bookings))
}

pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = recurring::cancel_booking(&state.db_pool, id, &user.username).await?;
    if !deleted {
        return Err(AppError(BookingError::NotFound(format!(
            "Recurring booking {id} not found"
        ))));
    }

    info!("Cancelled recurring booking {} for {}", id, user.username);
    Ok(Json(serde_json::json!({ "message": "Booking cancelled" })))
}
