//! Fuzzy class matcher.
//!
//! Resolves a logical booking intent (name, time, optional instructor) to a
//! concrete scraped [`ClassCandidate`]. Start time is the primary
//! discriminant because the portal phrases and capitalizes class names
//! inconsistently from day to day; among time-matching candidates the best
//! weighted name/instructor similarity wins.

use chrono::NaiveTime;

use crate::models::class::ClassCandidate;

/// Acceptance threshold on the 0-100 similarity scale. Empirically tuned to
/// the remote site's naming noise; overridable via scheduler config.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 48.0;

const NAME_WEIGHT: f64 = 0.7;
const INSTRUCTOR_WEIGHT: f64 = 0.3;

/// Diagnostics returned when nothing clears the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct NoMatch {
    /// Best score seen among time-matching candidates, 0.0 when none shared
    /// the target time.
    pub best_score: f64,
    /// Name of the nearest candidate, for operator diagnostics.
    pub nearest: Option<String>,
}

/// Normalized string similarity on a 0-100 scale, case-insensitive.
fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase()) * 100.0
}

fn score(candidate: &ClassCandidate, target_name: &str, target_instructor: Option<&str>) -> f64 {
    let name_score = similarity(&candidate.name, target_name);
    match target_instructor {
        Some(instructor) if !instructor.is_empty() => {
            let instructor_score = candidate
                .instructor
                .as_deref()
                .map(|c| similarity(c, instructor))
                .unwrap_or(0.0);
            name_score * NAME_WEIGHT + instructor_score * INSTRUCTOR_WEIGHT
        }
        _ => name_score,
    }
}

/// Find the best-scoring candidate at exactly `target_time`.
///
/// Deterministic: ties resolve to the first candidate in scrape order.
pub fn match_class<'a>(
    candidates: &'a [ClassCandidate],
    target_name: &str,
    target_time: NaiveTime,
    target_instructor: Option<&str>,
    threshold: f64,
) -> Result<&'a ClassCandidate, NoMatch> {
    let mut best: Option<(&ClassCandidate, f64)> = None;

    for candidate in candidates.iter().filter(|c| c.start_time == target_time) {
        let s = score(candidate, target_name, target_instructor);
        // Strict comparison keeps the first candidate on ties.
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((candidate, s));
        }
    }

    match best {
        Some((candidate, s)) if s >= threshold => Ok(candidate),
        Some((candidate, s)) => Err(NoMatch {
            best_score: s,
            nearest: Some(candidate.name.clone()),
        }),
        None => Err(NoMatch {
            best_score: 0.0,
            nearest: None,
        }),
    }
}
