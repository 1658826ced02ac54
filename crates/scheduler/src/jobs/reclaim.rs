//! Daily reclaim of exhausted and abandoned records.
//!
//! `failed` is terminal only until an operator or this job intervenes:
//! records whose last attempt is older than the configured age return to
//! `pending` with a cleared retry counter, and any record still holding the
//! lock at this cadence belongs to a worker long gone.

use std::sync::Arc;

use eyre::Result;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::store::BookingStore;
use rebook_core::clock::Clock;

pub struct ReclaimJob<C: Clock> {
    store: Arc<dyn BookingStore>,
    clock: C,
    config: SchedulerConfig,
}

impl<C: Clock> ReclaimJob<C> {
    pub fn new(store: Arc<dyn BookingStore>, clock: C, config: SchedulerConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let cutoff = self.clock.now() - self.config.failed_reset_age();

        let failed = self.store.reset_failed_older_than(cutoff).await?;
        let stuck = self.store.reset_lingering_in_progress().await?;

        if failed + stuck > 0 {
            info!(
                "Reclaimed {} failed and {} stuck auto-bookings",
                failed, stuck
            );
        }

        Ok(())
    }
}
