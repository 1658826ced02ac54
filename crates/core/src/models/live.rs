use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A booking currently held on the remote portal, cached locally.
///
/// Rows are created when a booking attempt succeeds or when reconciliation
/// discovers a booking the cache does not know about, and removed when the
/// user cancels or reconciliation finds the booking gone remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveBooking {
    pub id: Uuid,
    pub username: String,
    pub class_name: String,
    pub class_date: NaiveDate,
    pub class_time: NaiveTime,
    pub instructor: Option<String>,
    /// The recurring definition that produced this row, when auto-booked.
    pub recurring_booking_id: Option<Uuid>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveBookingResponse {
    pub id: Uuid,
    pub class_name: String,
    pub class_date: NaiveDate,
    pub class_time: NaiveTime,
    pub instructor: Option<String>,
    pub auto_booked: bool,
}

impl From<LiveBooking> for LiveBookingResponse {
    fn from(b: LiveBooking) -> Self {
        Self {
            id: b.id,
            class_name: b.class_name,
            class_date: b.class_date,
            class_time: b.class_time,
            instructor: b.instructor,
            auto_booked: b.recurring_booking_id.is_some(),
        }
    }
}
