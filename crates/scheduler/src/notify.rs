//! Reminder delivery seam.
//!
//! The push delivery protocol is outside the orchestrator; the jobs only
//! need to hand a message to a notifier and distinguish "this endpoint is
//! dead" from other failures, so that dead subscriptions can be pruned.

use async_trait::async_trait;
use mockall::automock;
use rebook_core::models::subscription::PushSubscription;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum NotifyError {
    /// The push service reports the endpoint permanently gone; the
    /// subscription should be deleted.
    #[error("Subscription endpoint gone")]
    Gone,

    #[error("Notification delivery failed: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct ReminderMessage {
    pub title: String,
    pub body: String,
}

#[automock]
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn notify(
        &self,
        subscription: &PushSubscription,
        message: &ReminderMessage,
    ) -> Result<(), NotifyError>;
}

/// Default notifier: logs the reminder and reports success. Deployments wire
/// a real web-push implementation behind the same trait.
pub struct LogOnlyNotifier;

#[async_trait]
impl ReminderNotifier for LogOnlyNotifier {
    async fn notify(
        &self,
        subscription: &PushSubscription,
        message: &ReminderMessage,
    ) -> Result<(), NotifyError> {
        info!(
            "Reminder for {}: {} / {}",
            subscription.username, message.title, message.body
        );
        Ok(())
    }
}
