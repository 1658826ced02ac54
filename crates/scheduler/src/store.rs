//! Storage seam for the orchestrator.
//!
//! All coordination between workers goes through the persistent store, so
//! the whole operation set sits behind one trait: the processor and jobs are
//! tested against a mock, and `PgBookingStore` delegates to the repository
//! functions in production.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyre::Result;
use mockall::automock;
use rebook_core::models::recurring::BookingStatus;
use rebook_db::models::{DbLiveBooking, DbPushSubscription, DbRecurringBooking, DbSession};
use rebook_db::repositories::recurring::StatusUpdate;
use rebook_db::repositories::{live, recurring, session, subscription};
use rebook_db::DbPool;
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait BookingStore: Send + Sync {
    // Recurring bookings
    async fn get_pending_bookings(&self) -> Result<Vec<DbRecurringBooking>>;
    async fn get_in_progress_bookings(&self) -> Result<Vec<DbRecurringBooking>>;
    async fn get_booking_by_id(&self, id: Uuid) -> Result<Option<DbRecurringBooking>>;
    /// Atomic `pending -> in_progress` transition; false when another worker
    /// holds the record.
    async fn lock_booking(&self, id: Uuid) -> Result<bool>;
    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        update: StatusUpdate,
    ) -> Result<()>;
    async fn reset_failed_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
    async fn reset_lingering_in_progress(&self) -> Result<u64>;

    // Live bookings
    async fn upsert_live_booking<'a>(
        &self,
        username: &str,
        class_name: &str,
        class_date: NaiveDate,
        class_time: NaiveTime,
        instructor: Option<&'a str>,
        recurring_booking_id: Option<Uuid>,
    ) -> Result<DbLiveBooking>;
    async fn rename_live_booking(&self, id: Uuid, new_name: &str) -> Result<()>;
    async fn delete_live_booking(&self, id: Uuid) -> Result<bool>;
    async fn list_live_bookings_for_user(&self, username: &str) -> Result<Vec<DbLiveBooking>>;
    async fn get_unsent_reminder_bookings(&self) -> Result<Vec<DbLiveBooking>>;
    async fn mark_reminder_sent(&self, id: Uuid) -> Result<()>;

    // Sessions
    async fn load_session(&self, username: &str) -> Result<Option<DbSession>>;
    async fn save_session(
        &self,
        username: &str,
        sealed_password: &str,
        session_blob: &str,
    ) -> Result<()>;
    async fn touch_session(&self, username: &str) -> Result<()>;
    async fn list_session_usernames(&self) -> Result<Vec<String>>;

    // Push subscriptions
    async fn list_subscriptions_for_user(&self, username: &str)
        -> Result<Vec<DbPushSubscription>>;
    async fn delete_subscription_by_endpoint(&self, endpoint: &str) -> Result<bool>;
}

/// Production store backed by the Postgres repositories.
pub struct PgBookingStore {
    pool: DbPool,
}

impl PgBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn get_pending_bookings(&self) -> Result<Vec<DbRecurringBooking>> {
        recurring::get_pending_bookings(&self.pool).await
    }

    async fn get_in_progress_bookings(&self) -> Result<Vec<DbRecurringBooking>> {
        recurring::get_in_progress_bookings(&self.pool).await
    }

    async fn get_booking_by_id(&self, id: Uuid) -> Result<Option<DbRecurringBooking>> {
        recurring::get_booking_by_id(&self.pool, id).await
    }

    async fn lock_booking(&self, id: Uuid) -> Result<bool> {
        recurring::lock_booking(&self.pool, id).await
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        update: StatusUpdate,
    ) -> Result<()> {
        recurring::update_booking_status(&self.pool, id, status.as_str(), &update).await
    }

    async fn reset_failed_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        recurring::reset_failed_older_than(&self.pool, cutoff).await
    }

    async fn reset_lingering_in_progress(&self) -> Result<u64> {
        recurring::reset_lingering_in_progress(&self.pool).await
    }

    async fn upsert_live_booking<'a>(
        &self,
        username: &str,
        class_name: &str,
        class_date: NaiveDate,
        class_time: NaiveTime,
        instructor: Option<&'a str>,
        recurring_booking_id: Option<Uuid>,
    ) -> Result<DbLiveBooking> {
        live::upsert_live_booking(
            &self.pool,
            username,
            class_name,
            class_date,
            class_time,
            instructor,
            recurring_booking_id,
        )
        .await
    }

    async fn rename_live_booking(&self, id: Uuid, new_name: &str) -> Result<()> {
        live::rename_live_booking(&self.pool, id, new_name).await
    }

    async fn delete_live_booking(&self, id: Uuid) -> Result<bool> {
        live::delete_live_booking(&self.pool, id).await
    }

    async fn list_live_bookings_for_user(&self, username: &str) -> Result<Vec<DbLiveBooking>> {
        live::list_live_bookings_for_user(&self.pool, username).await
    }

    async fn get_unsent_reminder_bookings(&self) -> Result<Vec<DbLiveBooking>> {
        live::get_unsent_reminder_bookings(&self.pool).await
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> Result<()> {
        live::mark_reminder_sent(&self.pool, id).await
    }

    async fn load_session(&self, username: &str) -> Result<Option<DbSession>> {
        session::load_session(&self.pool, username).await
    }

    async fn save_session(
        &self,
        username: &str,
        sealed_password: &str,
        session_blob: &str,
    ) -> Result<()> {
        session::save_session(&self.pool, username, sealed_password, session_blob).await
    }

    async fn touch_session(&self, username: &str) -> Result<()> {
        session::touch_session(&self.pool, username).await
    }

    async fn list_session_usernames(&self) -> Result<Vec<String>> {
        session::list_session_usernames(&self.pool).await
    }

    async fn list_subscriptions_for_user(
        &self,
        username: &str,
    ) -> Result<Vec<DbPushSubscription>> {
        subscription::list_subscriptions_for_user(&self.pool, username).await
    }

    async fn delete_subscription_by_endpoint(&self, endpoint: &str) -> Result<bool> {
        subscription::delete_subscription_by_endpoint(&self.pool, endpoint).await
    }
}
