//! Mock portal client for orchestrator tests.
//!
//! `BookingStore`, `ClientProvider`, and `ReminderNotifier` get their mocks
//! from `#[automock]` on the traits themselves; the portal trait lives in
//! another crate, so its double is declared here.

use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;

use rebook_core::models::class::{BookingAction, BookingOutcome, ClassCandidate, LiveBookingSnapshot};
use rebook_portal::{ClassSchedule, PortalApi, PortalError, SessionBlob};

mock! {
    pub Portal {}

    #[async_trait]
    impl PortalApi for Portal {
        async fn login(&self, password: &str) -> Result<(), PortalError>;

        async fn fetch_classes_for_date(
            &self,
            date: NaiveDate,
        ) -> Result<ClassSchedule, PortalError>;

        async fn execute(
            &self,
            candidate: &ClassCandidate,
            action: BookingAction,
        ) -> Result<BookingOutcome, PortalError>;

        async fn fetch_current_bookings(&self) -> Result<Vec<LiveBookingSnapshot>, PortalError>;

        fn session_blob(&self) -> SessionBlob;
    }
}

impl std::fmt::Debug for MockPortal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPortal").finish()
    }
}
