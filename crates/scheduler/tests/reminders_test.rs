use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rebook_db::models::{DbLiveBooking, DbPushSubscription};
use rebook_core::clock::FixedClock;
use rebook_scheduler::config::SchedulerConfig;
use rebook_scheduler::jobs::reminders::ReminderJob;
use rebook_scheduler::notify::{MockReminderNotifier, NotifyError};
use rebook_scheduler::store::MockBookingStore;
use uuid::Uuid;

/// Clock fixed so that a class at 18:00 on 2025-10-13 starts in exactly
/// 3 hours 30 minutes: squarely inside the reminder band.
fn clock_in_band() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2025, 10, 13, 14, 30, 0).unwrap())
}

fn live_booking() -> DbLiveBooking {
    DbLiveBooking {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        class_name: "Vinyasa Yoga".to_string(),
        class_date: NaiveDate::from_ymd_opt(2025, 10, 13).unwrap(),
        class_time: NaiveTime::parse_from_str("18:00", "%H:%M").unwrap(),
        instructor: None,
        recurring_booking_id: None,
        reminder_sent: false,
        created_at: Utc.with_ymd_and_hms(2025, 10, 12, 18, 0, 0).unwrap(),
    }
}

fn subscription() -> DbPushSubscription {
    DbPushSubscription {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        endpoint: "https://push.example/ep1".to_string(),
        p256dh_key: "p256dh".to_string(),
        auth_key: "auth".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap(),
    }
}

fn job(
    store: MockBookingStore,
    notifier: MockReminderNotifier,
    clock: FixedClock,
) -> ReminderJob<FixedClock> {
    ReminderJob::new(
        Arc::new(store),
        Arc::new(notifier),
        clock,
        SchedulerConfig::default(),
    )
}

#[tokio::test]
async fn test_reminder_sent_inside_window() {
    let row = live_booking();
    let row_id = row.id;

    let mut store = MockBookingStore::new();
    store
        .expect_get_unsent_reminder_bookings()
        .returning(move || Ok(vec![row.clone()]));
    store
        .expect_list_subscriptions_for_user()
        .returning(|_| Ok(vec![subscription()]));
    store
        .expect_mark_reminder_sent()
        .withf(move |id| *id == row_id)
        .times(1)
        .returning(|_| Ok(()));

    let mut notifier = MockReminderNotifier::new();
    notifier
        .expect_notify()
        .withf(|sub, message| {
            sub.username == "alice" && message.body.contains("Vinyasa Yoga")
        })
        .times(1)
        .returning(|_, _| Ok(()));

    job(store, notifier, clock_in_band()).run().await.unwrap();
}

#[tokio::test]
async fn test_no_reminder_outside_window() {
    // Class starts in 5 hours: too early for a reminder.
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 10, 13, 13, 0, 0).unwrap());

    let mut store = MockBookingStore::new();
    store
        .expect_get_unsent_reminder_bookings()
        .returning(|| Ok(vec![live_booking()]));
    // No subscription lookup, no notification, no flag write.

    job(store, MockReminderNotifier::new(), clock).run().await.unwrap();
}

#[tokio::test]
async fn test_band_has_passed_for_imminent_class() {
    // Class starts in 3 hours: the band has already closed.
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 10, 13, 15, 0, 0).unwrap());

    let mut store = MockBookingStore::new();
    store
        .expect_get_unsent_reminder_bookings()
        .returning(|| Ok(vec![live_booking()]));

    job(store, MockReminderNotifier::new(), clock).run().await.unwrap();
}

#[tokio::test]
async fn test_marked_sent_even_without_subscription() {
    let row = live_booking();
    let row_id = row.id;

    let mut store = MockBookingStore::new();
    store
        .expect_get_unsent_reminder_bookings()
        .returning(move || Ok(vec![row.clone()]));
    store
        .expect_list_subscriptions_for_user()
        .returning(|_| Ok(vec![]));
    // Still flagged, so the job does not retry it every minute.
    store
        .expect_mark_reminder_sent()
        .withf(move |id| *id == row_id)
        .times(1)
        .returning(|_| Ok(()));

    job(store, MockReminderNotifier::new(), clock_in_band())
        .run()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_gone_endpoint_deletes_subscription() {
    let row = live_booking();

    let mut store = MockBookingStore::new();
    store
        .expect_get_unsent_reminder_bookings()
        .returning(move || Ok(vec![row.clone()]));
    store
        .expect_list_subscriptions_for_user()
        .returning(|_| Ok(vec![subscription()]));
    store
        .expect_delete_subscription_by_endpoint()
        .withf(|endpoint| endpoint == "https://push.example/ep1")
        .times(1)
        .returning(|_| Ok(true));
    store
        .expect_mark_reminder_sent()
        .times(1)
        .returning(|_| Ok(()));

    let mut notifier = MockReminderNotifier::new();
    notifier
        .expect_notify()
        .times(1)
        .returning(|_, _| Err(NotifyError::Gone));

    job(store, notifier, clock_in_band()).run().await.unwrap();
}

#[tokio::test]
async fn test_delivery_error_still_marks_sent() {
    let row = live_booking();

    let mut store = MockBookingStore::new();
    store
        .expect_get_unsent_reminder_bookings()
        .returning(move || Ok(vec![row.clone()]));
    store
        .expect_list_subscriptions_for_user()
        .returning(|_| Ok(vec![subscription()]));
    // The subscription survives a transient delivery failure.
    store
        .expect_mark_reminder_sent()
        .times(1)
        .returning(|_| Ok(()));

    let mut notifier = MockReminderNotifier::new();
    notifier
        .expect_notify()
        .times(1)
        .returning(|_, _| Err(NotifyError::Other("503 from push service".to_string())));

    job(store, notifier, clock_in_band()).run().await.unwrap();
}

#[tokio::test]
async fn test_window_edges() {
    let config = SchedulerConfig::default();
    assert_eq!(config.reminder_lead_min(), Duration::minutes(205));
    assert_eq!(config.reminder_lead_max(), Duration::minutes(215));
}
