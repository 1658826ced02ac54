//! Auto-booking processor.
//!
//! One cycle walks every `pending` recurring booking, computes its next
//! occurrence, and attempts the booking when inside the eligibility window.
//! The record-level lock is an atomic `pending -> in_progress` transition in
//! the store; everything after the lock funnels through a guaranteed release
//! so a lock never outlives a cycle, with the staleness reclaim as second
//! line of defense against a worker that died mid-attempt.
//!
//! Per-record failures never escape: every exit path becomes a status and
//! retry-counter mutation on that record alone.

use std::sync::Arc;

use chrono::NaiveDate;
use eyre::Result;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::diagnostics::DiagnosticSink;
use crate::session::ClientProvider;
use crate::store::BookingStore;
use rebook_core::clock::Clock;
use rebook_core::matcher::match_class;
use rebook_core::models::class::{BookingAction, BookingOutcome};
use rebook_core::models::recurring::{BookingStatus, RecurringBooking};
use rebook_core::occurrence::{booking_window_open, next_occurrence, occurrence_start};
use rebook_db::models::DbRecurringBooking;
use rebook_db::repositories::recurring::StatusUpdate;
use rebook_portal::resilience::with_relogin;
use rebook_portal::{PortalApi, PortalError};

/// What a single attempt produced, before the retry policies are applied.
enum AttemptResult {
    Booked { resolved_name: String },
    AlreadyHeld { class_name: String },
    NoMatch {
        best_score: f64,
        nearest: Option<String>,
        raw_html: String,
    },
    NotBookable { outcome: BookingOutcome },
}

pub struct AutoBookingProcessor<C: Clock> {
    store: Arc<dyn BookingStore>,
    provider: Arc<dyn ClientProvider>,
    diagnostics: DiagnosticSink,
    config: SchedulerConfig,
    clock: C,
}

impl<C: Clock> AutoBookingProcessor<C> {
    pub fn new(
        store: Arc<dyn BookingStore>,
        provider: Arc<dyn ClientProvider>,
        diagnostics: DiagnosticSink,
        config: SchedulerConfig,
        clock: C,
    ) -> Self {
        Self {
            store,
            provider,
            diagnostics,
            config,
            clock,
        }
    }

    pub async fn run_cycle(&self) -> Result<()> {
        self.reclaim_stuck().await?;

        let pending = self.store.get_pending_bookings().await?;
        debug!("Processing {} pending auto-bookings", pending.len());

        for row in pending {
            let id = row.id;

            let locked = match self.store.lock_booking(id).await {
                Ok(locked) => locked,
                Err(e) => {
                    error!("Failed to lock auto-booking {}: {}", id, e);
                    continue;
                }
            };
            if !locked {
                debug!(
                    "Auto-booking {} already claimed by another worker, skipping",
                    id
                );
                continue;
            }

            if let Err(e) = self.process_locked(row).await {
                error!("Error processing auto-booking {}: {}", id, e);
            }
            // We hold the lock; it must never outlive the cycle, whatever
            // happened above.
            if let Err(e) = self.release_if_locked(id).await {
                error!("Failed to release lock on auto-booking {}: {}", id, e);
            }
        }

        Ok(())
    }

    /// Force abandoned `in_progress` records back to `pending`: a stale
    /// last-attempt timestamp, or none at all, means the owning worker died
    /// before releasing.
    async fn reclaim_stuck(&self) -> Result<()> {
        let now = self.clock.now();

        for row in self.store.get_in_progress_bookings().await? {
            let stale = match row.last_attempt_at {
                Some(at) => now - at > self.config.staleness(),
                None => true,
            };
            if stale {
                warn!(
                    "Auto-booking {} stuck in 'in_progress'; resetting to 'pending'",
                    row.id
                );
                self.store
                    .update_booking_status(
                        row.id,
                        BookingStatus::Pending,
                        StatusUpdate {
                            last_attempt_at: Some(now),
                            retry_count: Some(0),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }

        Ok(())
    }

    async fn process_locked(&self, summary: DbRecurringBooking) -> Result<()> {
        let id = summary.id;

        // Re-read for a consistent view now that we hold the lock.
        let Some(row) = self.store.get_booking_by_id(id).await? else {
            warn!("Auto-booking {} vanished after locking, skipping", id);
            return Ok(());
        };
        if row.status != BookingStatus::InProgress.as_str() {
            warn!(
                "Auto-booking {} not 'in_progress' after locking, skipping",
                id
            );
            return Ok(());
        }

        let booking = match row.into_domain() {
            Ok(booking) => booking,
            Err(e) => {
                error!("Auto-booking {} has malformed fields: {}", id, e);
                self.store
                    .update_booking_status(
                        id,
                        BookingStatus::Failed,
                        StatusUpdate {
                            last_attempt_at: Some(self.clock.now()),
                            retry_count: Some(self.config.max_retries),
                            ..Default::default()
                        },
                    )
                    .await?;
                return Ok(());
            }
        };

        let now = self.clock.now();
        let occurrence = next_occurrence(now.date_naive(), booking.day_of_week);

        if booking.last_booked_date == Some(occurrence) {
            // This occurrence is already handled; just release the lock.
            self.release(id).await?;
            return Ok(());
        }

        let class_start = occurrence_start(occurrence, booking.target_time);
        if !booking_window_open(now.naive_utc(), class_start, self.config.booking_window()) {
            // Too early to book.
            self.release(id).await?;
            return Ok(());
        }

        let client = match self.provider.obtain(&booking.username, None).await {
            Ok(client) => client,
            Err(e) => {
                warn!(
                    "No portal session for {} (auto-booking {}): {}",
                    booking.username, id, e
                );
                return self.apply_failure(&booking, "portal session unavailable").await;
            }
        };

        info!(
            "Attempting to book '{}' on {} at {} for {} (auto-booking {})",
            booking.class_name, occurrence, booking.target_time, booking.username, id
        );

        let attempt = with_relogin(
            || self.attempt_once(client.as_ref(), &booking, occurrence),
            || self.provider.relogin(&booking.username, &client),
        )
        .await;

        match attempt {
            Ok(AttemptResult::Booked { resolved_name }) => {
                self.apply_success(&booking, occurrence, &resolved_name).await
            }
            Ok(AttemptResult::AlreadyHeld { class_name }) => {
                info!(
                    "{} already holds '{}' on {} (auto-booking {})",
                    booking.username, class_name, occurrence, id
                );
                self.apply_success(&booking, occurrence, &class_name).await
            }
            Ok(AttemptResult::NoMatch {
                best_score,
                nearest,
                raw_html,
            }) => {
                self.apply_no_match(&booking, best_score, nearest, raw_html)
                    .await
            }
            Ok(AttemptResult::NotBookable { outcome }) => {
                self.apply_failure(&booking, &format!("{outcome:?}")).await
            }
            Err(PortalError::SessionExpired) => self.apply_session_expired(&booking).await,
            Err(e) => self.apply_failure(&booking, &e.to_string()).await,
        }
    }

    /// One fetch-match-execute pass. Session expiry propagates as the error
    /// so the surrounding combinator can re-login and retry once.
    async fn attempt_once(
        &self,
        client: &dyn PortalApi,
        booking: &RecurringBooking,
        occurrence: NaiveDate,
    ) -> Result<AttemptResult, PortalError> {
        let schedule = client.fetch_classes_for_date(occurrence).await?;

        let matched = match match_class(
            &schedule.candidates,
            &booking.class_name,
            booking.target_time,
            booking.instructor.as_deref(),
            self.config.match_threshold,
        ) {
            Ok(candidate) => candidate,
            Err(no_match) => {
                return Ok(AttemptResult::NoMatch {
                    best_score: no_match.best_score,
                    nearest: no_match.nearest,
                    raw_html: schedule.raw_html,
                });
            }
        };

        match client.execute(matched, BookingAction::Book).await? {
            BookingOutcome::Success { resolved_name } => {
                Ok(AttemptResult::Booked { resolved_name })
            }
            BookingOutcome::AlreadyHeld => Ok(AttemptResult::AlreadyHeld {
                class_name: matched.name.clone(),
            }),
            outcome => Ok(AttemptResult::NotBookable { outcome }),
        }
    }

    async fn apply_success(
        &self,
        booking: &RecurringBooking,
        occurrence: NaiveDate,
        resolved_name: &str,
    ) -> Result<()> {
        self.store
            .update_booking_status(
                booking.id,
                BookingStatus::Pending,
                StatusUpdate {
                    last_booked_date: Some(occurrence),
                    last_attempt_at: Some(self.clock.now()),
                    retry_count: Some(0),
                },
            )
            .await?;

        self.store
            .upsert_live_booking(
                &booking.username,
                resolved_name,
                occurrence,
                booking.target_time,
                booking.instructor.as_deref(),
                Some(booking.id),
            )
            .await?;

        info!(
            "Successfully processed auto-booking {} for {} ('{}')",
            booking.id, occurrence, resolved_name
        );
        Ok(())
    }

    /// Tighter budget for no-match: a class that keeps not appearing points
    /// at a naming or schedule problem, not a transient glitch. The raw
    /// schedule HTML goes to the diagnostic sink, fire-and-forget.
    async fn apply_no_match(
        &self,
        booking: &RecurringBooking,
        best_score: f64,
        nearest: Option<String>,
        raw_html: String,
    ) -> Result<()> {
        self.diagnostics
            .queue(&format!("booking_{}", booking.id), raw_html);

        let retries = booking.retry_count + 1;
        if retries < self.config.no_match_max_retries {
            warn!(
                "No match for auto-booking {} (best score {:.1}, nearest {:?}); retrying (attempt {})",
                booking.id, best_score, nearest, retries
            );
            self.record_attempt(booking.id, BookingStatus::Pending, retries)
                .await
        } else {
            error!(
                "No match for auto-booking {} after {} attempts (best score {:.1}, nearest {:?}); marking failed",
                booking.id, retries, best_score, nearest
            );
            self.record_attempt(booking.id, BookingStatus::Failed, retries)
                .await
        }
    }

    async fn apply_failure(&self, booking: &RecurringBooking, reason: &str) -> Result<()> {
        let retries = booking.retry_count + 1;
        if retries < self.config.max_retries {
            warn!(
                "Booking attempt failed for auto-booking {} ({}); retrying (attempt {})",
                booking.id, reason, retries
            );
            self.record_attempt(booking.id, BookingStatus::Pending, retries)
                .await
        } else {
            error!(
                "Booking attempt failed for auto-booking {} after {} attempts ({}); marking failed",
                booking.id, retries, reason
            );
            self.record_attempt(booking.id, BookingStatus::Failed, retries)
                .await
        }
    }

    /// Expiry that survived the one re-login retry. Expected to self-heal on
    /// a later cycle, so the record stays `pending` whatever the counter
    /// says.
    async fn apply_session_expired(&self, booking: &RecurringBooking) -> Result<()> {
        warn!(
            "Session expired for {} during auto-booking {}; will retry next cycle",
            booking.username, booking.id
        );
        self.record_attempt(booking.id, BookingStatus::Pending, booking.retry_count + 1)
            .await
    }

    async fn record_attempt(&self, id: Uuid, status: BookingStatus, retries: i32) -> Result<()> {
        self.store
            .update_booking_status(
                id,
                status,
                StatusUpdate {
                    last_attempt_at: Some(self.clock.now()),
                    retry_count: Some(retries),
                    ..Default::default()
                },
            )
            .await
    }

    /// Release the lock without touching the retry state.
    async fn release(&self, id: Uuid) -> Result<()> {
        self.store
            .update_booking_status(id, BookingStatus::Pending, StatusUpdate::default())
            .await
    }

    async fn release_if_locked(&self, id: Uuid) -> Result<()> {
        if let Some(row) = self.store.get_booking_by_id(id).await? {
            if row.status == BookingStatus::InProgress.as_str() {
                warn!(
                    "Auto-booking {} was left 'in_progress'; resetting to 'pending'",
                    id
                );
                self.release(id).await?;
            }
        }
        Ok(())
    }
}
