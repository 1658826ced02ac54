use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    /// The portal answered with its "redirected to login" signal. Transient:
    /// the resilience layer re-authenticates and retries exactly once.
    #[error("Session expired")]
    SessionExpired,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// No scraped class cleared the acceptance threshold. Carries the best
    /// score seen and the nearest candidate name for diagnostics.
    #[error("No matching class found (best score {best_score:.1})")]
    NoMatch {
        best_score: f64,
        nearest: Option<String>,
    },

    #[error("Remote site failure: {0}")]
    TransientRemote(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type BookingResult<T> = Result<T, BookingError>;
