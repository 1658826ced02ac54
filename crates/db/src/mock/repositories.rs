use chrono::{NaiveDate, NaiveTime};
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbLiveBooking, DbPushSubscription, DbRecurringBooking, DbSession};
use crate::repositories::recurring::StatusUpdate;

// Mock repositories for testing

mock! {
    pub RecurringBookingRepo {
        pub async fn add_recurring_booking(
            &self,
            username: String,
            class_name: String,
            target_time: NaiveTime,
            day_of_week: String,
            instructor: Option<String>,
        ) -> eyre::Result<DbRecurringBooking>;

        pub async fn get_pending_bookings(&self) -> eyre::Result<Vec<DbRecurringBooking>>;

        pub async fn get_booking_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbRecurringBooking>>;

        pub async fn lock_booking(&self, id: Uuid) -> eyre::Result<bool>;

        pub async fn update_booking_status(
            &self,
            id: Uuid,
            status: String,
            update: StatusUpdate,
        ) -> eyre::Result<()>;

        pub async fn list_bookings_for_user(
            &self,
            username: String,
        ) -> eyre::Result<Vec<DbRecurringBooking>>;

        pub async fn cancel_booking(&self, id: Uuid, username: String) -> eyre::Result<bool>;
    }
}

mock! {
    pub LiveBookingRepo {
        pub async fn upsert_live_booking(
            &self,
            username: String,
            class_name: String,
            class_date: NaiveDate,
            class_time: NaiveTime,
            instructor: Option<String>,
            recurring_booking_id: Option<Uuid>,
        ) -> eyre::Result<DbLiveBooking>;

        pub async fn list_live_bookings_for_user(
            &self,
            username: String,
        ) -> eyre::Result<Vec<DbLiveBooking>>;

        pub async fn delete_live_booking(&self, id: Uuid) -> eyre::Result<bool>;
    }
}

mock! {
    pub SessionRepo {
        pub async fn save_session(
            &self,
            username: String,
            sealed_password: String,
            session_blob: String,
        ) -> eyre::Result<()>;

        pub async fn load_session(&self, username: String) -> eyre::Result<Option<DbSession>>;

        pub async fn touch_session(&self, username: String) -> eyre::Result<()>;

        pub async fn delete_session(&self, username: String) -> eyre::Result<bool>;
    }
}

mock! {
    pub SubscriptionRepo {
        pub async fn save_subscription(
            &self,
            username: String,
            endpoint: String,
            p256dh_key: String,
            auth_key: String,
        ) -> eyre::Result<DbPushSubscription>;

        pub async fn list_subscriptions_for_user(
            &self,
            username: String,
        ) -> eyre::Result<Vec<DbPushSubscription>>;

        pub async fn delete_subscription_by_endpoint(
            &self,
            endpoint: String,
        ) -> eyre::Result<bool>;
    }
}
