//! # Rebook Scheduler
//!
//! The recurring-booking orchestrator: a small set of periodic jobs driven
//! on independent cadences over a bounded worker pool.
//!
//! - the auto-booking processor (every minute) walks pending recurring
//!   bookings and attempts any that entered their eligibility window;
//! - the cancellation-reminder sender (every minute) notifies users shortly
//!   before a booked class starts;
//! - the reclaim job (daily) returns exhausted and abandoned records to
//!   circulation;
//! - the session refresher (every few hours) revalidates stored portal
//!   sessions and reconciles the live-booking cache.
//!
//! Each job runs in its own loop task, so a job never overlaps itself; the
//! shared semaphore bounds how many jobs run at once, so one user's slow
//! portal call cannot starve everything else. All cross-worker coordination
//! goes through atomic conditional updates in the store, never through
//! in-process state.

pub mod config;
pub mod diagnostics;
pub mod jobs;
pub mod mock;
pub mod notify;
pub mod processor;
pub mod reconciler;
pub mod session;
pub mod store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use eyre::{eyre, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::diagnostics::DiagnosticSink;
use crate::jobs::reclaim::ReclaimJob;
use crate::jobs::refresh::SessionRefreshJob;
use crate::jobs::reminders::ReminderJob;
use crate::notify::{LogOnlyNotifier, ReminderNotifier};
use crate::processor::AutoBookingProcessor;
use crate::session::{ClientProvider, SessionManager};
use crate::store::{BookingStore, PgBookingStore};
use rebook_core::clock::{Clock, SystemClock};
use rebook_db::crypto::CredentialSealer;
use rebook_db::DbPool;
use rebook_portal::PortalConfig;

pub struct Scheduler<C: Clock + 'static> {
    config: SchedulerConfig,
    processor: Arc<AutoBookingProcessor<C>>,
    reminders: Arc<ReminderJob<C>>,
    reclaim: Arc<ReclaimJob<C>>,
    refresh: Arc<SessionRefreshJob>,
}

impl Scheduler<SystemClock> {
    /// Wire the full production scheduler from environment configuration.
    /// Also spawns the diagnostic writer task and returns its handle.
    pub fn from_env(pool: DbPool) -> Result<(Self, JoinHandle<()>)> {
        let config = SchedulerConfig::from_env()?;
        let portal_config = PortalConfig::from_env()?;

        let encryption_key = std::env::var("REBOOK_ENCRYPTION_KEY")
            .map_err(|_| eyre!("REBOOK_ENCRYPTION_KEY environment variable must be set"))?;
        let sealer = CredentialSealer::from_hex_key(&encryption_key)?;

        let clock = SystemClock;
        let store: Arc<dyn BookingStore> = Arc::new(PgBookingStore::new(pool));
        let provider: Arc<dyn ClientProvider> = Arc::new(SessionManager::new(
            store.clone(),
            sealer,
            portal_config,
            clock.clone(),
            &config,
        ));

        let (sink, rx) = DiagnosticSink::new(32);
        let writer = diagnostics::spawn_writer(rx, config.diagnostics_dir.clone());

        let notifier: Arc<dyn ReminderNotifier> = Arc::new(LogOnlyNotifier);

        let scheduler = Self::new(config, store, provider, notifier, sink, clock);
        Ok((scheduler, writer))
    }
}

impl<C: Clock + 'static> Scheduler<C> {
    pub fn new(
        config: SchedulerConfig,
        store: Arc<dyn BookingStore>,
        provider: Arc<dyn ClientProvider>,
        notifier: Arc<dyn ReminderNotifier>,
        diagnostics: DiagnosticSink,
        clock: C,
    ) -> Self {
        let processor = Arc::new(AutoBookingProcessor::new(
            store.clone(),
            provider.clone(),
            diagnostics,
            config.clone(),
            clock.clone(),
        ));
        let reminders = Arc::new(ReminderJob::new(
            store.clone(),
            notifier,
            clock.clone(),
            config.clone(),
        ));
        let reclaim = Arc::new(ReclaimJob::new(store.clone(), clock, config.clone()));
        let refresh = Arc::new(SessionRefreshJob::new(store, provider));

        Self {
            config,
            processor,
            reminders,
            reclaim,
            refresh,
        }
    }

    /// Run all four jobs until the process is stopped.
    pub async fn run(self) -> Result<()> {
        info!(
            "Scheduler starting: processor every {}s, reminders every {}s, reclaim every {}s, refresh every {}s",
            self.config.processor_interval_secs,
            self.config.reminder_interval_secs,
            self.config.reclaim_interval_secs,
            self.config.refresh_interval_secs,
        );

        let permits = Arc::new(Semaphore::new(self.config.worker_permits));

        let handles = vec![
            spawn_job(
                "auto_booking_processor",
                Duration::from_secs(self.config.processor_interval_secs),
                permits.clone(),
                {
                    let processor = self.processor.clone();
                    move || {
                        let processor = processor.clone();
                        async move { processor.run_cycle().await }
                    }
                },
            ),
            spawn_job(
                "cancellation_reminder_sender",
                Duration::from_secs(self.config.reminder_interval_secs),
                permits.clone(),
                {
                    let reminders = self.reminders.clone();
                    move || {
                        let reminders = reminders.clone();
                        async move { reminders.run().await }
                    }
                },
            ),
            spawn_job(
                "failed_booking_reclaimer",
                Duration::from_secs(self.config.reclaim_interval_secs),
                permits.clone(),
                {
                    let reclaim = self.reclaim.clone();
                    move || {
                        let reclaim = reclaim.clone();
                        async move { reclaim.run().await }
                    }
                },
            ),
            spawn_job(
                "session_refresher",
                Duration::from_secs(self.config.refresh_interval_secs),
                permits,
                {
                    let refresh = self.refresh.clone();
                    move || {
                        let refresh = refresh.clone();
                        async move { refresh.run().await }
                    }
                },
            ),
        ];

        for handle in handles {
            handle.await?;
        }

        Ok(())
    }
}

/// Drive one job on a fixed cadence. The single loop per job means a job can
/// never overlap itself; the shared semaphore bounds concurrency across
/// jobs. Missed ticks are skipped rather than replayed in a burst.
fn spawn_job<F, Fut>(
    name: &'static str,
    period: Duration,
    permits: Arc<Semaphore>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let Ok(permit) = permits.acquire().await else {
                break;
            };
            debug!("Running job {}", name);
            if let Err(e) = job().await {
                error!("Job {} failed: {}", name, e);
            }
            drop(permit);
        }
    })
}
