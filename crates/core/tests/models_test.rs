use chrono::{NaiveTime, Utc, Weekday};
use pretty_assertions::assert_eq;
use rebook_core::models::recurring::{
    day_name, BookingStatus, RecurringBooking, RecurringBookingResponse,
};
use uuid::Uuid;

#[test]
fn test_booking_status_round_trip() {
    for status in [
        BookingStatus::Pending,
        BookingStatus::InProgress,
        BookingStatus::Failed,
    ] {
        assert_eq!(BookingStatus::parse(status.as_str()).unwrap(), status);
    }
}

#[test]
fn test_booking_status_rejects_unknown() {
    assert!(BookingStatus::parse("booked").is_err());
}

#[test]
fn test_day_name_is_full_name() {
    assert_eq!(day_name(Weekday::Mon), "Monday");
    assert_eq!(day_name(Weekday::Sun), "Sunday");
}

#[test]
fn test_weekday_parses_stored_day_names() {
    // The stored TEXT form must round-trip through chrono's parser.
    for day in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ] {
        let parsed: Weekday = day_name(day).parse().unwrap();
        assert_eq!(parsed, day);
    }
}

#[test]
fn test_recurring_booking_response_conversion() {
    let booking = RecurringBooking {
        id: Uuid::new_v4(),
        username: "alice".to_string(),
        class_name: "Vinyasa Yoga".to_string(),
        target_time: NaiveTime::parse_from_str("18:00", "%H:%M").unwrap(),
        day_of_week: Weekday::Mon,
        instructor: Some("Maria".to_string()),
        status: BookingStatus::Pending,
        created_at: Utc::now(),
        last_attempt_at: None,
        retry_count: 0,
        last_booked_date: None,
    };

    let response = RecurringBookingResponse::from(booking.clone());
    assert_eq!(response.id, booking.id);
    assert_eq!(response.day_of_week, "Monday");
    assert_eq!(response.status, BookingStatus::Pending);
    assert_eq!(response.retry_count, 0);
}
