use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// What the scraped booking form lets the user do for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Signup,
    WaitingList,
    Cancel,
}

/// Opaque submission handle scraped from a class's booking form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingForm {
    pub class_id: String,
    /// Server-issued occurrence timestamp the portal requires echoed back.
    pub timestamp: String,
    /// AJAX handler name from the form's request attribute.
    pub handler: String,
    pub kind: FormKind,
}

/// One class as scraped from the portal's schedule for a single date. The
/// universe the matcher searches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCandidate {
    pub name: String,
    pub start_time: NaiveTime,
    pub instructor: Option<String>,
    pub remaining_spaces: Option<u32>,
    /// Absent when the class offers no action right now (e.g. already held,
    /// or sign-up not open).
    pub form: Option<BookingForm>,
    /// Status note rendered in place of a form, e.g. "You are already
    /// registered".
    pub status_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Book,
    Cancel,
}

/// Classified result of submitting a booking or cancellation.
///
/// A stale-session response is not an outcome: it surfaces as
/// `PortalError::SessionExpired` so the resilience layer can re-login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    /// Booked (or wait-listed). Carries the class name exactly as the portal
    /// renders it, which may differ in casing or wording from the request.
    Success { resolved_name: String },
    /// The portal reports the user already registered or on the waiting
    /// list. A successful terminal state, not an error.
    AlreadyHeld,
    NoCapacity,
    /// Class found but no actionable form was available.
    FormUnavailable,
    /// Response did not match any known shape.
    Unknown { message: String },
}

/// One booking as scraped from the member's current-bookings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveBookingSnapshot {
    pub class_name: String,
    pub class_date: NaiveDate,
    pub class_time: NaiveTime,
    pub waitlisted: bool,
}
