use rebook_core::errors::BookingError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    /// The portal answered an authenticated request with its login redirect.
    #[error("Portal session expired")]
    SessionExpired,

    #[error("Portal login rejected: {0}")]
    AuthFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse portal response: {0}")]
    Parse(String),
}

impl From<PortalError> for BookingError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::SessionExpired => BookingError::SessionExpired,
            PortalError::AuthFailed(msg) => BookingError::AuthFailed(msg),
            PortalError::Http(e) => BookingError::TransientRemote(e.to_string()),
            PortalError::Parse(msg) => BookingError::TransientRemote(msg),
        }
    }
}
