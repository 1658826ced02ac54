//! Calendar math for weekly occurrences, the booking eligibility window, and
//! the cancellation-reminder window.
//!
//! Class times are portal-local wall-clock values (`NaiveTime`/`NaiveDate`);
//! callers project the clock's `DateTime<Utc>` to naive before comparing.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// The next calendar date on or after `today` that falls on `target`.
/// `today` itself qualifies when the weekday matches.
pub fn next_occurrence(today: NaiveDate, target: Weekday) -> NaiveDate {
    let days_until = (target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    today + Duration::days(days_until)
}

/// Combine an occurrence date with a class start time.
pub fn occurrence_start(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// Whether a booking attempt is currently allowed: the window opens `window`
/// before the class starts and never closes early (late attempts simply find
/// the class gone).
pub fn booking_window_open(now: NaiveDateTime, class_start: NaiveDateTime, window: Duration) -> bool {
    now >= class_start - window
}

/// Whether `now` lies inside the reminder band before the class, i.e.
/// `lead_min <= class_start - now <= lead_max`. The band approximates "3.5
/// hours before" without needing sub-minute scheduling precision.
pub fn in_reminder_window(
    now: NaiveDateTime,
    class_start: NaiveDateTime,
    lead_min: Duration,
    lead_max: Duration,
) -> bool {
    let lead = class_start - now;
    lead >= lead_min && lead <= lead_max
}
