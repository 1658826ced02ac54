use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route("/api/bookings", get(handlers::live::list_live_bookings))
}
