//! # Live Booking Handlers
//!
//! Read-only view over the cached live bookings. The cache is maintained by
//! the scheduler (successful bookings and periodic reconciliation against
//! the portal), so this endpoint never talks to the portal itself.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{
    middleware::{auth::AuthUser, error_handling::AppError},
    ApiState,
};
use rebook_core::models::live::{LiveBooking, LiveBookingResponse};
use rebook_db::repositories::live;

pub async fn list_live_bookings(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<LiveBookingResponse>>, AppError> {
    let rows = live::list_live_bookings_for_user(&state.db_pool, &user.username).await?;

    let bookings = rows
        .into_iter()
        .map(|row| LiveBookingResponse::from(LiveBooking::from(row)))
        .collect();

    Ok(Json(bookings))
}
