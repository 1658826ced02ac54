//! Session provider.
//!
//! Produces authenticated portal clients for a username, either from the
//! persisted session blob or by fresh credential login. There is no
//! in-process session cache: every call resolves from the store, so workers
//! in separate processes stay consistent and a restart loses nothing.
//!
//! Consecutive login failures for one user trip a cool-down during which
//! every obtain fails fast without touching the portal; a site that has
//! started rate-limiting gets no further load from us until it cools off.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::automock;
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::store::BookingStore;
use rebook_core::clock::Clock;
use rebook_core::errors::{BookingError, BookingResult};
use rebook_db::crypto::CredentialSealer;
use rebook_portal::{PortalApi, PortalClient, PortalConfig, PortalError, SessionBlob};

/// Source of authenticated portal clients, mockable for processor tests.
#[automock]
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// With a password: fresh credential login, persisting the new session.
    /// Without: restore from the stored blob; expiry surfaces lazily on use.
    async fn obtain<'a>(
        &self,
        username: &str,
        password: Option<&'a str>,
    ) -> BookingResult<Arc<dyn PortalApi>>;

    /// Re-authenticate an existing client with the stored credential and
    /// persist the refreshed blob. Used by the retry-once combinator.
    async fn relogin(
        &self,
        username: &str,
        client: &Arc<dyn PortalApi>,
    ) -> Result<(), PortalError>;
}

#[derive(Debug, Default)]
struct FailureState {
    consecutive: u32,
    cooldown_until: Option<DateTime<Utc>>,
}

/// Per-username consecutive-failure tracking with fail-fast cool-down.
struct LoginGuard<C: Clock> {
    clock: C,
    threshold: u32,
    cooldown: Duration,
    states: Mutex<HashMap<String, FailureState>>,
}

impl<C: Clock> LoginGuard<C> {
    fn new(clock: C, threshold: u32, cooldown: Duration) -> Self {
        Self {
            clock,
            threshold,
            cooldown,
            states: Mutex::new(HashMap::new()),
        }
    }

    fn cooling_down(&self, username: &str) -> bool {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states
            .get(username)
            .and_then(|s| s.cooldown_until)
            .is_some_and(|until| self.clock.now() < until)
    }

    fn record_failure(&self, username: &str) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let state = states.entry(username.to_string()).or_default();
        state.consecutive += 1;
        if state.consecutive >= self.threshold {
            let until = self.clock.now() + self.cooldown;
            state.cooldown_until = Some(until);
            warn!(
                "{} consecutive login failures for {}; cooling down until {}",
                state.consecutive, username, until
            );
        }
    }

    fn record_success(&self, username: &str) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.remove(username);
    }
}

pub struct SessionManager<C: Clock> {
    store: Arc<dyn BookingStore>,
    sealer: CredentialSealer,
    portal_config: PortalConfig,
    guard: LoginGuard<C>,
}

impl<C: Clock> SessionManager<C> {
    pub fn new(
        store: Arc<dyn BookingStore>,
        sealer: CredentialSealer,
        portal_config: PortalConfig,
        clock: C,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            store,
            sealer,
            portal_config,
            guard: LoginGuard::new(clock, config.login_failure_threshold, config.login_cooldown()),
        }
    }

    async fn fresh_login(
        &self,
        username: &str,
        password: &str,
    ) -> BookingResult<Arc<dyn PortalApi>> {
        let client = PortalClient::new(
            self.portal_config.clone(),
            username,
            SessionBlob::default(),
        )
        .map_err(BookingError::from)?;

        match client.login(password).await {
            Ok(()) => {
                let sealed = self.sealer.seal(password).map_err(BookingError::Database)?;
                let blob = client
                    .session_blob()
                    .to_json()
                    .map_err(BookingError::Database)?;
                self.store
                    .save_session(username, &sealed, &blob)
                    .await
                    .map_err(BookingError::Database)?;
                self.guard.record_success(username);
                Ok(Arc::new(client))
            }
            Err(e) => {
                self.guard.record_failure(username);
                Err(e.into())
            }
        }
    }

    async fn restore(&self, username: &str) -> BookingResult<Arc<dyn PortalApi>> {
        let session = self
            .store
            .load_session(username)
            .await
            .map_err(BookingError::Database)?
            .ok_or_else(|| {
                BookingError::AuthFailed(format!("No stored session for {username}"))
            })?;

        let blob = SessionBlob::from_json(&session.session_blob).map_err(BookingError::Database)?;
        let client = PortalClient::new(self.portal_config.clone(), username, blob)
            .map_err(BookingError::from)?;
        Ok(Arc::new(client))
    }
}

#[async_trait]
impl<C: Clock + 'static> ClientProvider for SessionManager<C> {
    async fn obtain<'a>(
        &self,
        username: &str,
        password: Option<&'a str>,
    ) -> BookingResult<Arc<dyn PortalApi>> {
        if self.guard.cooling_down(username) {
            return Err(BookingError::AuthFailed(format!(
                "Login cool-down active for {username}"
            )));
        }

        match password {
            Some(pw) => self.fresh_login(username, pw).await,
            None => self.restore(username).await,
        }
    }

    async fn relogin(
        &self,
        username: &str,
        client: &Arc<dyn PortalApi>,
    ) -> Result<(), PortalError> {
        if self.guard.cooling_down(username) {
            return Err(PortalError::AuthFailed(format!(
                "Login cool-down active for {username}"
            )));
        }

        let session = self
            .store
            .load_session(username)
            .await
            .map_err(|e| PortalError::AuthFailed(format!("Could not load stored session: {e}")))?
            .ok_or_else(|| {
                PortalError::AuthFailed(format!("No stored session for {username}"))
            })?;

        let password = self
            .sealer
            .open(&session.sealed_password)
            .map_err(|e| PortalError::AuthFailed(format!("Could not unseal credential: {e}")))?;

        match client.login(&password).await {
            Ok(()) => {
                self.guard.record_success(username);
                info!("Re-login successful for {}", username);

                let blob = client
                    .session_blob()
                    .to_json()
                    .map_err(|e| PortalError::Parse(e.to_string()))?;
                // A failed persist leaves the old blob behind; the session
                // itself is valid, so don't fail the re-login over it.
                if let Err(e) = self
                    .store
                    .save_session(username, &session.sealed_password, &blob)
                    .await
                {
                    warn!("Could not persist refreshed session for {}: {}", username, e);
                }
                Ok(())
            }
            Err(e) => {
                self.guard.record_failure(username);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rebook_core::clock::FixedClock;

    fn fixed_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2025, 10, 12, 18, 0, 0).unwrap())
    }

    #[test]
    fn test_guard_trips_after_threshold_failures() {
        let guard = LoginGuard::new(fixed_clock(), 3, Duration::minutes(15));

        guard.record_failure("alice");
        guard.record_failure("alice");
        assert!(!guard.cooling_down("alice"));

        guard.record_failure("alice");
        assert!(guard.cooling_down("alice"));
        // Other users are unaffected.
        assert!(!guard.cooling_down("bob"));
    }

    #[test]
    fn test_guard_cooldown_expires() {
        let clock = fixed_clock();
        let guard = LoginGuard::new(clock.clone(), 3, Duration::minutes(15));

        for _ in 0..3 {
            guard.record_failure("alice");
        }
        assert!(guard.cooling_down("alice"));

        clock.advance(Duration::minutes(16));
        assert!(!guard.cooling_down("alice"));
    }

    #[test]
    fn test_guard_success_clears_failures() {
        let guard = LoginGuard::new(fixed_clock(), 3, Duration::minutes(15));

        guard.record_failure("alice");
        guard.record_failure("alice");
        guard.record_success("alice");

        // Counter restarted: two more failures still below threshold.
        guard.record_failure("alice");
        guard.record_failure("alice");
        assert!(!guard.cooling_down("alice"));
    }

    #[tokio::test]
    async fn test_obtain_fails_fast_during_cooldown() {
        let store: Arc<dyn BookingStore> = Arc::new(crate::store::MockBookingStore::new());
        let sealer = CredentialSealer::from_hex_key(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        )
        .unwrap();
        let portal_config = PortalConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "test".to_string(),
            request_timeout: std::time::Duration::from_secs(1),
        };
        let config = SchedulerConfig::default();
        let manager = SessionManager::new(store, sealer, portal_config, fixed_clock(), &config);

        for _ in 0..3 {
            manager.guard.record_failure("alice");
        }

        // No store or network interaction happens: the mock has no
        // expectations and would panic if touched.
        let err = manager.obtain("alice", Some("pw")).await.unwrap_err();
        assert!(err.to_string().contains("cool-down"));
    }
}
