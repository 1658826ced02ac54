use chrono::{NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;
use rebook_core::models::class::FormKind;
use rebook_portal::parse::{parse_csrf_token, parse_current_bookings, parse_schedule};

const SCHEDULE_FIXTURE: &str = r#"
<div class="class grid">
    <h2 class="title">Vinyasa Yoga</h2>
    <div class="description">Flow through postures with breath.</div>
    <span itemprop="startDate">18:00</span>
    <p>With Maria.</p>
    <span class="remaining">5</span>
    <form data-request="onBook">
        <input name="id" value="4711" />
        <input name="timestamp" value="1760378400" />
        <button type="submit" class="signup">Book</button>
    </form>
</div>
<div class="class grid">
    <h2 class="title">BoxFit</h2>
    <span itemprop="startDate">19:45</span>
    <span class="remaining">0</span>
    <form data-request="onBook">
        <input name="id" value="4712" />
        <input name="timestamp" value="1760384700" />
        <button type="submit" class="waitinglist">Join waiting list</button>
    </form>
</div>
<div class="class grid">
    <h2 class="title">Spin</h2>
    <span itemprop="startDate">07:30</span>
    <p>You are already registered for this class</p>
</div>
"#;

#[test]
fn test_parse_schedule_extracts_candidates() {
    let candidates = parse_schedule(SCHEDULE_FIXTURE).unwrap();
    assert_eq!(candidates.len(), 3);

    let yoga = &candidates[0];
    assert_eq!(yoga.name, "Vinyasa Yoga");
    assert_eq!(
        yoga.start_time,
        NaiveTime::parse_from_str("18:00", "%H:%M").unwrap()
    );
    assert_eq!(yoga.instructor.as_deref(), Some("Maria"));
    assert_eq!(yoga.remaining_spaces, Some(5));

    let form = yoga.form.as_ref().unwrap();
    assert_eq!(form.class_id, "4711");
    assert_eq!(form.timestamp, "1760378400");
    assert_eq!(form.handler, "onBook");
    assert_eq!(form.kind, FormKind::Signup);
}

#[test]
fn test_parse_schedule_classifies_waitlist_form() {
    let candidates = parse_schedule(SCHEDULE_FIXTURE).unwrap();
    let boxfit = &candidates[1];

    assert_eq!(boxfit.remaining_spaces, Some(0));
    assert_eq!(boxfit.form.as_ref().unwrap().kind, FormKind::WaitingList);
}

#[test]
fn test_parse_schedule_captures_status_note_when_no_form() {
    let candidates = parse_schedule(SCHEDULE_FIXTURE).unwrap();
    let spin = &candidates[2];

    assert!(spin.form.is_none());
    let note = spin.status_note.as_deref().unwrap();
    assert!(note.to_lowercase().contains("already registered"));
}

#[test]
fn test_parse_schedule_skips_entries_without_time() {
    let html = r#"
    <div class="class grid">
        <h2 class="title">Mystery Class</h2>
        <span itemprop="startDate">soon</span>
    </div>
    <div class="class grid">
        <h2 class="title">Pilates</h2>
        <span itemprop="startDate">09:15</span>
    </div>
    "#;

    let candidates = parse_schedule(html).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "Pilates");
}

#[test]
fn test_parse_schedule_empty_html() {
    assert!(parse_schedule("<div></div>").unwrap().is_empty());
}

#[test]
fn test_parse_csrf_token_from_meta_tag() {
    let html = r#"<html><head><meta name="csrf-token" content="tok-123"></head></html>"#;
    assert_eq!(parse_csrf_token(html).as_deref(), Some("tok-123"));
    assert_eq!(parse_csrf_token("<html></html>"), None);
}

#[test]
fn test_parse_current_bookings() {
    let html = r#"
    <div id="upcoming_bookings">
        <ul>
            <li>Vinyasa Yoga - 2025-10-06 19:45</li>
            <li><strong>WAITINGLIST</strong> BoxFit - 2025-10-07 07:00</li>
            <li>not a booking line</li>
        </ul>
    </div>
    "#;

    let bookings = parse_current_bookings(html).unwrap();
    assert_eq!(bookings.len(), 2);

    assert_eq!(bookings[0].class_name, "Vinyasa Yoga");
    assert_eq!(
        bookings[0].class_date,
        NaiveDate::from_ymd_opt(2025, 10, 6).unwrap()
    );
    assert_eq!(
        bookings[0].class_time,
        NaiveTime::parse_from_str("19:45", "%H:%M").unwrap()
    );
    assert!(!bookings[0].waitlisted);

    assert_eq!(bookings[1].class_name, "BoxFit");
    assert!(bookings[1].waitlisted);
}

#[test]
fn test_parse_current_bookings_without_container() {
    let bookings = parse_current_bookings("<div id=\"other\"></div>").unwrap();
    assert!(bookings.is_empty());
}
