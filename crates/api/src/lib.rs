//! # Rebook API
//!
//! The API crate provides the web server for the Rebook recurring-booking
//! service. It is deliberately thin: authentication is delegated to the
//! booking portal, all unattended work (auto-booking, reminders,
//! reconciliation) lives in the scheduler, and these endpoints only manage
//! the records the scheduler operates on.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Provide authentication and error handling
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database interactions.

/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use eyre::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::middleware::auth::JwtKeys;
use rebook_db::crypto::CredentialSealer;
use rebook_portal::PortalConfig;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// JWT signing/validation keys
    pub jwt: JwtKeys,
    /// Sealer for stored portal credentials
    pub sealer: CredentialSealer,
    /// Connection settings for the remote booking portal
    pub portal_config: PortalConfig,
}

/// Starts the API server with the provided configuration and database
/// connection.
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let portal_config = PortalConfig::from_env()?;
    let sealer = CredentialSealer::from_hex_key(&config.encryption_key)?;
    let jwt = JwtKeys::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl_hours * 60 * 60,
    );

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        jwt,
        sealer,
        portal_config,
    });

    // Build the application router with all routes
    let app = Router::new()
        .merge(routes::health::routes())
        .merge(routes::auth::routes())
        .merge(routes::recurring::routes())
        .merge(routes::live::routes())
        .merge(routes::push::routes())
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect::<Vec<_>>();
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
