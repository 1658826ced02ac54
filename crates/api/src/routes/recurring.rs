use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/recurring", post(handlers::recurring::create_booking))
        .route("/api/recurring", get(handlers::recurring::list_bookings))
        .route(
            "/api/recurring/:id",
            delete(handlers::recurring::cancel_booking),
        )
}
