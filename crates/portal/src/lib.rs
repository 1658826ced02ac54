//! # Rebook Portal
//!
//! Client for the remote class-booking portal. The portal exposes no API:
//! only server-rendered HTML behind CSRF tokens and session cookies that
//! expire without warning. This crate owns the whole boundary: credential
//! login, per-date schedule scraping, booking/cancellation submission with
//! outcome classification, and the members-page scrape of currently held
//! bookings.
//!
//! Session expiry is a first-class condition here: every authenticated call
//! returns [`error::PortalError::SessionExpired`] when the portal bounces the
//! request to its login page, and [`resilience::with_relogin`] retries an
//! operation exactly once after a successful re-authentication.

pub mod client;
pub mod error;
pub mod parse;
pub mod resilience;
pub mod session_blob;

pub use client::{PortalApi, PortalClient, PortalConfig};
pub use error::PortalError;
pub use session_blob::SessionBlob;

use chrono::NaiveDate;
use rebook_core::models::class::ClassCandidate;

/// The scraped schedule for one calendar date, keeping the raw partial
/// around for the no-match diagnostic path.
#[derive(Debug, Clone)]
pub struct ClassSchedule {
    pub date: NaiveDate,
    pub candidates: Vec<ClassCandidate>,
    pub raw_html: String,
}
