use chrono::NaiveTime;
use pretty_assertions::assert_eq;
use rebook_core::matcher::{match_class, DEFAULT_MATCH_THRESHOLD};
use rebook_core::models::class::ClassCandidate;

fn candidate(name: &str, time: &str, instructor: Option<&str>) -> ClassCandidate {
    ClassCandidate {
        name: name.to_string(),
        start_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        instructor: instructor.map(String::from),
        remaining_spaces: Some(5),
        form: None,
        status_note: None,
    }
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

#[test]
fn test_misspelled_name_at_matching_time_is_selected() {
    let candidates = vec![
        candidate("Yoga Flw", "10:00", None),
        candidate("Boxing", "10:00", None),
    ];

    let matched = match_class(
        &candidates,
        "Yoga Flow",
        time("10:00"),
        None,
        DEFAULT_MATCH_THRESHOLD,
    )
    .expect("near-identical name should clear the threshold");

    assert_eq!(matched.name, "Yoga Flw");
}

#[test]
fn test_no_candidate_at_target_time_is_no_match() {
    let candidates = vec![
        candidate("Yoga Flow", "09:00", None),
        candidate("Yoga Flow", "11:00", None),
    ];

    let err = match_class(
        &candidates,
        "Yoga Flow",
        time("10:00"),
        None,
        DEFAULT_MATCH_THRESHOLD,
    )
    .unwrap_err();

    assert_eq!(err.best_score, 0.0);
    assert_eq!(err.nearest, None);
}

#[test]
fn test_dissimilar_names_below_threshold_carry_diagnostics() {
    let candidates = vec![
        candidate("Boxing", "10:00", None),
        candidate("Spin", "10:00", None),
    ];

    let err = match_class(
        &candidates,
        "Vinyasa Yoga",
        time("10:00"),
        None,
        DEFAULT_MATCH_THRESHOLD,
    )
    .unwrap_err();

    assert!(err.best_score < DEFAULT_MATCH_THRESHOLD);
    assert!(err.nearest.is_some());
}

#[test]
fn test_matching_is_deterministic() {
    let candidates = vec![
        candidate("Yoga Flow", "10:00", Some("Alice")),
        candidate("Yoga Flow Express", "10:00", Some("Bob")),
        candidate("Pilates", "10:00", None),
    ];

    let first = match_class(
        &candidates,
        "Yoga Flow",
        time("10:00"),
        None,
        DEFAULT_MATCH_THRESHOLD,
    )
    .unwrap()
    .name
    .clone();

    for _ in 0..10 {
        let again = match_class(
            &candidates,
            "Yoga Flow",
            time("10:00"),
            None,
            DEFAULT_MATCH_THRESHOLD,
        )
        .unwrap();
        assert_eq!(again.name, first);
    }
}

#[test]
fn test_ties_resolve_to_first_in_scrape_order() {
    // Two identically named candidates at the same time: the first wins.
    let candidates = vec![
        candidate("Spin", "18:00", Some("First")),
        candidate("Spin", "18:00", Some("Second")),
    ];

    let matched = match_class(
        &candidates,
        "Spin",
        time("18:00"),
        None,
        DEFAULT_MATCH_THRESHOLD,
    )
    .unwrap();

    assert_eq!(matched.instructor.as_deref(), Some("First"));
}

#[test]
fn test_instructor_similarity_breaks_name_ties() {
    let candidates = vec![
        candidate("Spin", "18:00", Some("Dave")),
        candidate("Spin", "18:00", Some("Maria")),
    ];

    let matched = match_class(
        &candidates,
        "Spin",
        time("18:00"),
        Some("Maria"),
        DEFAULT_MATCH_THRESHOLD,
    )
    .unwrap();

    assert_eq!(matched.instructor.as_deref(), Some("Maria"));
}

#[test]
fn test_case_differences_score_as_identical() {
    let candidates = vec![candidate("VINYASA YOGA", "18:00", None)];

    let matched = match_class(
        &candidates,
        "vinyasa yoga",
        time("18:00"),
        None,
        DEFAULT_MATCH_THRESHOLD,
    )
    .unwrap();

    assert_eq!(matched.name, "VINYASA YOGA");
}

#[test]
fn test_empty_candidate_list_is_no_match() {
    let err = match_class(&[], "Yoga", time("10:00"), None, DEFAULT_MATCH_THRESHOLD).unwrap_err();
    assert_eq!(err.nearest, None);
}
