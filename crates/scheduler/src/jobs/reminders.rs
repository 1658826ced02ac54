//! Cancellation-reminder sender.
//!
//! Fires a push reminder for each live booking whose class starts inside
//! the reminder band. The reminder flag is set whether or not delivery
//! happened: a user without a subscription, or a broken push endpoint, must
//! not cause the same reminder to be attempted every minute.

use std::sync::Arc;

use eyre::Result;
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::notify::{NotifyError, ReminderMessage, ReminderNotifier};
use crate::store::BookingStore;
use rebook_core::clock::Clock;
use rebook_core::models::subscription::PushSubscription;
use rebook_core::occurrence::in_reminder_window;
use rebook_db::models::DbLiveBooking;

pub struct ReminderJob<C: Clock> {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn ReminderNotifier>,
    clock: C,
    config: SchedulerConfig,
}

impl<C: Clock> ReminderJob<C> {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn ReminderNotifier>,
        clock: C,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let now = self.clock.now().naive_utc();

        for row in self.store.get_unsent_reminder_bookings().await? {
            let class_start = row.class_date.and_time(row.class_time);
            if !in_reminder_window(
                now,
                class_start,
                self.config.reminder_lead_min(),
                self.config.reminder_lead_max(),
            ) {
                continue;
            }

            self.send_reminder(&row).await?;
        }

        Ok(())
    }

    async fn send_reminder(&self, row: &DbLiveBooking) -> Result<()> {
        let subscriptions = self.store.list_subscriptions_for_user(&row.username).await?;

        if subscriptions.is_empty() {
            info!(
                "No push subscription for {}; marking reminder for '{}' as handled",
                row.username, row.class_name
            );
        }

        let message = ReminderMessage {
            title: "Upcoming class".to_string(),
            body: format!(
                "'{}' starts at {}. Last chance to cancel without losing the slot.",
                row.class_name,
                row.class_time.format("%H:%M")
            ),
        };

        for subscription in subscriptions {
            let subscription = PushSubscription::from(subscription);
            match self.notifier.notify(&subscription, &message).await {
                Ok(()) => info!(
                    "Sent cancellation reminder to {} for '{}'",
                    row.username, row.class_name
                ),
                Err(NotifyError::Gone) => {
                    warn!(
                        "Push endpoint gone for {}; deleting subscription",
                        row.username
                    );
                    if let Err(e) = self
                        .store
                        .delete_subscription_by_endpoint(&subscription.endpoint)
                        .await
                    {
                        error!(
                            "Failed to delete dead subscription for {}: {}",
                            row.username, e
                        );
                    }
                }
                Err(e) => error!(
                    "Error sending cancellation reminder to {}: {}",
                    row.username, e
                ),
            }
        }

        self.store.mark_reminder_sent(row.id).await?;
        Ok(())
    }
}
