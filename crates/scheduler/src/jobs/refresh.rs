//! Session refresher.
//!
//! Walks every user with a persisted session, proactively revalidates it by
//! scraping their current bookings, reconciles the live-booking cache, and
//! touches the session row. An expired session is only logged here; the next
//! obtain re-logs-in from the sealed credential.

use std::sync::Arc;

use eyre::Result;
use tracing::{error, info, warn};

use crate::reconciler::reconcile;
use crate::session::ClientProvider;
use crate::store::BookingStore;
use rebook_portal::resilience::with_relogin;
use rebook_portal::PortalError;

pub struct SessionRefreshJob {
    store: Arc<dyn BookingStore>,
    provider: Arc<dyn ClientProvider>,
}

impl SessionRefreshJob {
    pub fn new(store: Arc<dyn BookingStore>, provider: Arc<dyn ClientProvider>) -> Self {
        Self { store, provider }
    }

    pub async fn run(&self) -> Result<()> {
        let usernames = self.store.list_session_usernames().await?;
        if usernames.is_empty() {
            info!("No users found for session refresh");
            return Ok(());
        }

        for username in usernames {
            let client = match self.provider.obtain(&username, None).await {
                Ok(client) => client,
                Err(e) => {
                    warn!("Could not get portal client for {}: {}", username, e);
                    continue;
                }
            };

            let result = with_relogin(
                || client.fetch_current_bookings(),
                || self.provider.relogin(&username, &client),
            )
            .await;

            match result {
                Ok(scraped) => {
                    match reconcile(self.store.as_ref(), &username, &scraped).await {
                        Ok(stats) if stats.total() > 0 => info!(
                            "Reconciled live bookings for {}: {} added, {} removed, {} renamed",
                            username, stats.added, stats.removed, stats.renamed
                        ),
                        Ok(_) => {}
                        Err(e) => error!("Reconciliation failed for {}: {}", username, e),
                    }

                    if let Err(e) = self.store.touch_session(&username).await {
                        error!("Failed to touch session for {}: {}", username, e);
                    }
                }
                Err(PortalError::SessionExpired) => info!(
                    "Session for {} was expired; re-login will happen on next use",
                    username
                ),
                Err(e) => error!("Session refresh failed for {}: {}", username, e),
            }
        }

        Ok(())
    }
}
