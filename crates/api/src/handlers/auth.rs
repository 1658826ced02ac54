//! # Authentication Handlers
//!
//! Login is delegated to the booking portal: the handler performs a fresh
//! credential login there, seals the credential, persists the session blob
//! for the unattended scheduler, and returns a bearer token for this API.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::{middleware::error_handling::AppError, ApiState};
use rebook_core::errors::BookingError;
use rebook_core::models::auth::{LoginRequest, LoginResponse};
use rebook_db::repositories::session;
use rebook_portal::{PortalApi, PortalClient, SessionBlob};

pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(AppError(BookingError::Validation(
            "Username and password required".to_string(),
        )));
    }

    info!("Login attempt for user: {}", request.username);

    let client = PortalClient::new(
        state.portal_config.clone(),
        &request.username,
        SessionBlob::default(),
    )
    .map_err(BookingError::from)?;

    if let Err(e) = client.login(&request.password).await {
        warn!("Failed login for user {}: {}", request.username, e);
        return Err(AppError(e.into()));
    }

    // Persist the authenticated session so the scheduler can re-use it.
    let sealed = state
        .sealer
        .seal(&request.password)
        .map_err(BookingError::Database)?;
    let blob = client
        .session_blob()
        .to_json()
        .map_err(BookingError::Database)?;
    session::save_session(&state.db_pool, &request.username, &sealed, &blob).await?;

    let access_token = state
        .jwt
        .issue(&request.username)
        .map_err(|e| BookingError::Internal(Box::new(e)))?;

    info!("Created session and token for {}", request.username);
    Ok(Json(LoginResponse { access_token }))
}

pub async fn logout(
    State(state): State<Arc<ApiState>>,
    user: crate::middleware::auth::AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    session::delete_session(&state.db_pool, &user.username).await?;
    info!("Removed session for user: {}", user.username);
    Ok(Json(serde_json::json!({ "message": "Successfully logged out" })))
}
