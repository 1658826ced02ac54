use std::sync::Arc;

use axum::{
    routing::{delete, post},
    Router,
};

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/push/subscribe", post(handlers::push::subscribe))
        .route("/api/push/subscribe", delete(handlers::push::unsubscribe))
}
