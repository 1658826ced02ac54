use chrono::{NaiveTime, TimeZone, Utc};
use mockall::predicate;
use pretty_assertions::assert_eq;
use rebook_api::middleware::error_handling::AppError;
use rebook_core::errors::BookingError;
use rebook_core::models::recurring::RecurringBookingResponse;
use rebook_db::mock::repositories::{MockLiveBookingRepo, MockRecurringBookingRepo};
use rebook_db::models::DbRecurringBooking;
use uuid::Uuid;

// Test wrappers that exercise the handler logic against mocked repositories.

struct TestContext {
    recurring_repo: MockRecurringBookingRepo,
    live_repo: MockLiveBookingRepo,
}

impl TestContext {
    fn new() -> Self {
        Self {
            recurring_repo: MockRecurringBookingRepo::new(),
            live_repo: MockLiveBookingRepo::new(),
        }
    }
}

fn booking_row(id: Uuid, username: &str) -> DbRecurringBooking {
    DbRecurringBooking {
        id,
        username: username.to_string(),
        class_name: "Vinyasa Yoga".to_string(),
        target_time: NaiveTime::parse_from_str("18:00", "%H:%M").unwrap(),
        day_of_week: "Monday".to_string(),
        instructor: None,
        status: "pending".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap(),
        last_attempt_at: None,
        retry_count: 0,
        last_booked_date: None,
    }
}

async fn test_list_bookings_wrapper(
    ctx: &mut TestContext,
    username: &str,
) -> Result<Vec<RecurringBookingResponse>, AppError> {
    let rows = ctx
        .recurring_repo
        .list_bookings_for_user(username.to_string())
        .await?;

    rows.into_iter()
        .map(|row| row.into_domain().map(RecurringBookingResponse::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError)
}

async fn test_cancel_booking_wrapper(
    ctx: &mut TestContext,
    id: Uuid,
    username: &str,
) -> Result<(), AppError> {
    let deleted = ctx
        .recurring_repo
        .cancel_booking(id, username.to_string())
        .await?;
    if !deleted {
        return Err(AppError(BookingError::NotFound(format!(
            "Recurring booking {id} not found"
        ))));
    }
    Ok(())
}

#[tokio::test]
async fn test_list_bookings_converts_rows() {
    let mut ctx = TestContext::new();
    let id = Uuid::new_v4();

    ctx.recurring_repo
        .expect_list_bookings_for_user()
        .with(predicate::eq("alice".to_string()))
        .returning(move |_| Ok(vec![booking_row(id, "alice")]));

    let bookings = test_list_bookings_wrapper(&mut ctx, "alice").await.unwrap();

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, id);
    assert_eq!(bookings[0].day_of_week, "Monday");
}

#[tokio::test]
async fn test_list_bookings_surfaces_malformed_rows_as_errors() {
    let mut ctx = TestContext::new();

    ctx.recurring_repo
        .expect_list_bookings_for_user()
        .returning(|_| {
            let mut row = booking_row(Uuid::new_v4(), "alice");
            row.day_of_week = "Someday".to_string();
            Ok(vec![row])
        });

    let result = test_list_bookings_wrapper(&mut ctx, "alice").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cancel_booking_missing_is_not_found() {
    let mut ctx = TestContext::new();
    let id = Uuid::new_v4();

    ctx.recurring_repo
        .expect_cancel_booking()
        .returning(|_, _| Ok(false));

    let err = test_cancel_booking_wrapper(&mut ctx, id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_booking_deletes_owned_record() {
    let mut ctx = TestContext::new();
    let id = Uuid::new_v4();

    ctx.recurring_repo
        .expect_cancel_booking()
        .with(predicate::eq(id), predicate::eq("alice".to_string()))
        .returning(|_, _| Ok(true));

    test_cancel_booking_wrapper(&mut ctx, id, "alice")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_live_booking_listing_maps_to_response() {
    let mut ctx = TestContext::new();

    ctx.live_repo
        .expect_list_live_bookings_for_user()
        .returning(|username| {
            Ok(vec![rebook_db::models::DbLiveBooking {
                id: Uuid::new_v4(),
                username,
                class_name: "BoxFit".to_string(),
                class_date: chrono::NaiveDate::from_ymd_opt(2025, 10, 14).unwrap(),
                class_time: NaiveTime::parse_from_str("07:00", "%H:%M").unwrap(),
                instructor: None,
                recurring_booking_id: Some(Uuid::new_v4()),
                reminder_sent: false,
                created_at: Utc.with_ymd_and_hms(2025, 10, 13, 18, 0, 0).unwrap(),
            }])
        });

    let rows = ctx
        .live_repo
        .list_live_bookings_for_user("alice".to_string())
        .await
        .unwrap();
    let responses: Vec<rebook_core::models::live::LiveBookingResponse> = rows
        .into_iter()
        .map(|row| rebook_core::models::live::LiveBooking::from(row).into())
        .collect();

    assert_eq!(responses.len(), 1);
    assert!(responses[0].auto_booked);
}
