use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use rebook_core::errors::BookingError;
use rebook_core::models::live::LiveBooking;
use rebook_core::models::recurring::{BookingStatus, RecurringBooking};
use rebook_core::models::subscription::PushSubscription;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbRecurringBooking {
    pub id: Uuid,
    pub username: String,
    pub class_name: String,
    pub target_time: NaiveTime,
    pub day_of_week: String,
    pub instructor: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub last_booked_date: Option<NaiveDate>,
}

impl DbRecurringBooking {
    /// Convert into the typed domain record. Fails on a malformed stored
    /// day-of-week or status, which the processor treats as a terminal
    /// record-level error rather than a crash.
    pub fn into_domain(self) -> Result<RecurringBooking, BookingError> {
        let day_of_week: Weekday = self.day_of_week.parse().map_err(|_| {
            BookingError::Validation(format!("Invalid day_of_week '{}'", self.day_of_week))
        })?;
        let status = BookingStatus::parse(&self.status)?;

        Ok(RecurringBooking {
            id: self.id,
            username: self.username,
            class_name: self.class_name,
            target_time: self.target_time,
            day_of_week,
            instructor: self.instructor,
            status,
            created_at: self.created_at,
            last_attempt_at: self.last_attempt_at,
            retry_count: self.retry_count,
            last_booked_date: self.last_booked_date,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLiveBooking {
    pub id: Uuid,
    pub username: String,
    pub class_name: String,
    pub class_date: NaiveDate,
    pub class_time: NaiveTime,
    pub instructor: Option<String>,
    pub recurring_booking_id: Option<Uuid>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DbLiveBooking> for LiveBooking {
    fn from(row: DbLiveBooking) -> Self {
        LiveBooking {
            id: row.id,
            username: row.username,
            class_name: row.class_name,
            class_date: row.class_date,
            class_time: row.class_time,
            instructor: row.instructor,
            recurring_booking_id: row.recurring_booking_id,
            reminder_sent: row.reminder_sent,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSession {
    pub username: String,
    /// AEAD-sealed portal password, hex encoded.
    pub sealed_password: String,
    /// Serialized cookie jar + CSRF token.
    pub session_blob: String,
    pub last_used_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPushSubscription {
    pub id: Uuid,
    pub username: String,
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_key: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbPushSubscription> for PushSubscription {
    fn from(row: DbPushSubscription) -> Self {
        PushSubscription {
            id: row.id,
            username: row.username,
            endpoint: row.endpoint,
            p256dh_key: row.p256dh_key,
            auth_key: row.auth_key,
            created_at: row.created_at,
        }
    }
}
