use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BookingError;

/// Lifecycle status of a recurring booking record.
///
/// `InProgress` doubles as the record-level lock: at most one worker may hold
/// it per record, and only the processor transitions in and out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    InProgress,
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "in_progress" => Ok(BookingStatus::InProgress),
            "failed" => Ok(BookingStatus::Failed),
            other => Err(BookingError::Validation(format!(
                "Unknown booking status '{other}'"
            ))),
        }
    }
}

/// Full day name as stored and displayed ("Monday"), rather than chrono's
/// abbreviated `Display` form.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A weekly recurring booking definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringBooking {
    pub id: Uuid,
    pub username: String,
    pub class_name: String,
    pub target_time: NaiveTime,
    pub day_of_week: Weekday,
    pub instructor: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    /// Calendar date of the most recent occurrence already handled. Guards
    /// against submitting the same occurrence twice.
    pub last_booked_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecurringBookingRequest {
    pub class_name: String,
    /// Class start time, "HH:MM".
    pub target_time: NaiveTime,
    /// Full day name, e.g. "Monday".
    pub day_of_week: String,
    pub instructor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringBookingResponse {
    pub id: Uuid,
    pub class_name: String,
    pub target_time: NaiveTime,
    pub day_of_week: String,
    pub instructor: Option<String>,
    pub status: BookingStatus,
    pub retry_count: i32,
    pub last_booked_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<RecurringBooking> for RecurringBookingResponse {
    fn from(b: RecurringBooking) -> Self {
        Self {
            id: b.id,
            class_name: b.class_name,
            target_time: b.target_time,
            day_of_week: day_name(b.day_of_week).to_string(),
            instructor: b.instructor,
            status: b.status,
            retry_count: b.retry_count,
            last_booked_date: b.last_booked_date,
            created_at: b.created_at,
        }
    }
}
