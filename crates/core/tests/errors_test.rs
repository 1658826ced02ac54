use rebook_core::errors::{BookingError, BookingResult};
use std::error::Error;

#[test]
fn test_booking_error_display() {
    let expired = BookingError::SessionExpired;
    let auth = BookingError::AuthFailed("Invalid credentials".to_string());
    let no_match = BookingError::NoMatch {
        best_score: 31.5,
        nearest: Some("Boxing".to_string()),
    };
    let remote = BookingError::TransientRemote("connection reset".to_string());
    let not_found = BookingError::NotFound("Booking not found".to_string());
    let validation = BookingError::Validation("Invalid input".to_string());
    let database = BookingError::Database(eyre::eyre!("Database connection failed"));

    assert_eq!(expired.to_string(), "Session expired");
    assert_eq!(
        auth.to_string(),
        "Authentication failed: Invalid credentials"
    );
    assert_eq!(
        no_match.to_string(),
        "No matching class found (best score 31.5)"
    );
    assert_eq!(
        remote.to_string(),
        "Remote site failure: connection reset"
    );
    assert_eq!(not_found.to_string(), "Resource not found: Booking not found");
    assert_eq!(validation.to_string(), "Validation error: Invalid input");
    assert!(database.to_string().contains("Database error:"));
}

#[test]
fn test_error_source_chain() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let wrapped = BookingError::Internal(Box::new(io_error));

    assert!(wrapped.source().is_some());
}

#[test]
fn test_booking_result() {
    let ok: BookingResult<i32> = Ok(42);
    assert_eq!(ok.unwrap(), 42);

    let err: BookingResult<i32> = Err(BookingError::SessionExpired);
    assert!(err.is_err());
}
