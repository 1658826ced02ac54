//! Scheduler configuration.
//!
//! Every empirically tuned constant of the orchestrator lives here with an
//! environment override: the eligibility window, staleness threshold, retry
//! budgets, matcher threshold, login cool-down, and job cadences are all
//! calibrated against one external site's behavior and will drift with it.

use std::env;
use std::path::PathBuf;

use chrono::Duration;
use eyre::Result;
use rebook_core::matcher::DEFAULT_MATCH_THRESHOLD;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Auto-booking processor cadence in seconds.
    pub processor_interval_secs: u64,

    /// Cancellation-reminder sender cadence in seconds.
    pub reminder_interval_secs: u64,

    /// Failed/stuck booking reclaim cadence in seconds.
    pub reclaim_interval_secs: u64,

    /// Session refresher cadence in seconds.
    pub refresh_interval_secs: u64,

    /// Worker pool size shared by all jobs.
    pub worker_permits: usize,

    /// How long before a class the booking window opens, in hours.
    pub booking_window_hours: i64,

    /// How long an `in_progress` lock may sit before it is considered
    /// abandoned, in minutes.
    pub staleness_minutes: i64,

    /// Generic retry budget.
    pub max_retries: i32,

    /// Tighter budget for no-match failures; a persistent mismatch usually
    /// means a naming or schedule problem that will not self-resolve.
    pub no_match_max_retries: i32,

    /// Age at which the daily reclaim returns `failed` records to `pending`,
    /// in hours.
    pub failed_reset_hours: i64,

    /// Reminder band edges: a reminder fires when the class starts between
    /// `lead_max` and `lead_min` from now, in minutes.
    pub reminder_lead_min_minutes: i64,
    pub reminder_lead_max_minutes: i64,

    /// Matcher acceptance threshold on the 0-100 similarity scale.
    pub match_threshold: f64,

    /// Consecutive login failures before the cool-down engages.
    pub login_failure_threshold: u32,

    /// Cool-down length in minutes.
    pub login_cooldown_minutes: i64,

    /// Directory for no-match diagnostic HTML dumps.
    pub diagnostics_dir: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            processor_interval_secs: 60,
            reminder_interval_secs: 60,
            reclaim_interval_secs: 24 * 60 * 60,
            refresh_interval_secs: 4 * 60 * 60,
            worker_permits: 2,
            booking_window_hours: 48,
            staleness_minutes: 10,
            max_retries: 3,
            no_match_max_retries: 2,
            failed_reset_hours: 24,
            reminder_lead_min_minutes: 3 * 60 + 25,
            reminder_lead_max_minutes: 3 * 60 + 35,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            login_failure_threshold: 3,
            login_cooldown_minutes: 15,
            diagnostics_dir: PathBuf::from("diagnostics"),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from `REBOOK_*` environment variables, keeping
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            processor_interval_secs: env_or(
                "REBOOK_PROCESSOR_INTERVAL_SECONDS",
                defaults.processor_interval_secs,
            ),
            reminder_interval_secs: env_or(
                "REBOOK_REMINDER_INTERVAL_SECONDS",
                defaults.reminder_interval_secs,
            ),
            reclaim_interval_secs: env_or(
                "REBOOK_RECLAIM_INTERVAL_SECONDS",
                defaults.reclaim_interval_secs,
            ),
            refresh_interval_secs: env_or(
                "REBOOK_REFRESH_INTERVAL_SECONDS",
                defaults.refresh_interval_secs,
            ),
            worker_permits: env_or("REBOOK_WORKER_PERMITS", defaults.worker_permits),
            booking_window_hours: env_or("REBOOK_BOOKING_WINDOW_HOURS", defaults.booking_window_hours),
            staleness_minutes: env_or("REBOOK_STALENESS_MINUTES", defaults.staleness_minutes),
            max_retries: env_or("REBOOK_MAX_RETRIES", defaults.max_retries),
            no_match_max_retries: env_or(
                "REBOOK_NO_MATCH_MAX_RETRIES",
                defaults.no_match_max_retries,
            ),
            failed_reset_hours: env_or("REBOOK_FAILED_RESET_HOURS", defaults.failed_reset_hours),
            reminder_lead_min_minutes: env_or(
                "REBOOK_REMINDER_LEAD_MIN_MINUTES",
                defaults.reminder_lead_min_minutes,
            ),
            reminder_lead_max_minutes: env_or(
                "REBOOK_REMINDER_LEAD_MAX_MINUTES",
                defaults.reminder_lead_max_minutes,
            ),
            match_threshold: env_or("REBOOK_MATCH_THRESHOLD", defaults.match_threshold),
            login_failure_threshold: env_or(
                "REBOOK_LOGIN_FAILURE_THRESHOLD",
                defaults.login_failure_threshold,
            ),
            login_cooldown_minutes: env_or(
                "REBOOK_LOGIN_COOLDOWN_MINUTES",
                defaults.login_cooldown_minutes,
            ),
            diagnostics_dir: env::var("REBOOK_DIAGNOSTICS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.diagnostics_dir),
        })
    }

    pub fn booking_window(&self) -> Duration {
        Duration::hours(self.booking_window_hours)
    }

    pub fn staleness(&self) -> Duration {
        Duration::minutes(self.staleness_minutes)
    }

    pub fn failed_reset_age(&self) -> Duration {
        Duration::hours(self.failed_reset_hours)
    }

    pub fn reminder_lead_min(&self) -> Duration {
        Duration::minutes(self.reminder_lead_min_minutes)
    }

    pub fn reminder_lead_max(&self) -> Duration {
        Duration::minutes(self.reminder_lead_max_minutes)
    }

    pub fn login_cooldown(&self) -> Duration {
        Duration::minutes(self.login_cooldown_minutes)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuned_constants() {
        let config = SchedulerConfig::default();
        assert_eq!(config.booking_window(), Duration::hours(48));
        assert_eq!(config.staleness(), Duration::minutes(10));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.no_match_max_retries, 2);
        assert_eq!(config.worker_permits, 2);
        assert_eq!(config.login_failure_threshold, 3);
        assert_eq!(config.login_cooldown(), Duration::minutes(15));
    }
}
