//! Retry-once-after-re-login combinator.
//!
//! Session expiry is the one failure class worth an immediate retry: the
//! cure (a fresh login) is known and cheap. The combinator re-authenticates
//! exactly once and re-runs the operation exactly once; a second expiry, or
//! a failed re-login, surfaces to the caller. Never recursive, never
//! unbounded.

use std::future::Future;

use tracing::{info, warn};

use crate::error::PortalError;

pub async fn with_relogin<T, Op, OpFut, Re, ReFut>(op: Op, relogin: Re) -> Result<T, PortalError>
where
    Op: Fn() -> OpFut,
    OpFut: Future<Output = Result<T, PortalError>>,
    Re: FnOnce() -> ReFut,
    ReFut: Future<Output = Result<(), PortalError>>,
{
    match op().await {
        Err(PortalError::SessionExpired) => {
            info!("Session expired mid-operation, re-authenticating");
            match relogin().await {
                Ok(()) => op().await,
                Err(e) => {
                    warn!("Re-login after session expiry failed: {}", e);
                    Err(PortalError::SessionExpired)
                }
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_success_passes_through_without_relogin() {
        let relogins = AtomicUsize::new(0);

        let result = with_relogin(
            || async { Ok::<_, PortalError>(42) },
            || async {
                relogins.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(relogins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_then_success_retries_once() {
        let attempts = AtomicUsize::new(0);

        let result = with_relogin(
            || async {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(PortalError::SessionExpired)
                } else {
                    Ok(7)
                }
            },
            || async { Ok(()) },
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_relogin_surfaces_session_expired() {
        let attempts = AtomicUsize::new(0);

        let result: Result<i32, _> = with_relogin(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(PortalError::SessionExpired)
            },
            || async { Err(PortalError::AuthFailed("bad password".to_string())) },
        )
        .await;

        assert!(matches!(result, Err(PortalError::SessionExpired)));
        // The operation must not be retried when re-login fails.
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persistent_expiry_is_bounded_at_two_attempts() {
        let attempts = AtomicUsize::new(0);

        let result: Result<i32, _> = with_relogin(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(PortalError::SessionExpired)
            },
            || async { Ok(()) },
        )
        .await;

        assert!(matches!(result, Err(PortalError::SessionExpired)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let relogins = AtomicUsize::new(0);

        let result: Result<i32, _> = with_relogin(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(PortalError::Parse("garbled".to_string()))
            },
            || async {
                relogins.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(PortalError::Parse(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(relogins.load(Ordering::SeqCst), 0);
    }
}
