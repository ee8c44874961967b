//! Bounded wait-and-retry around interactions with a flaky remote UI.
//!
//! Every attempt is capped by [`RetryPolicy::wait_timeout`]; an expired
//! attempt counts as a transient [`AppError::WaitTimeout`]. Transient
//! failures sleep for [`RetryPolicy::backoff`] and try again until the
//! budget is spent. Anything else propagates on the spot.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::error::AppError;

/// Whether the caller treats absence of the target as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// Exhausting the budget raises [`AppError::RetryExhausted`].
    Always,
    /// Exhausting the budget yields `None` / an empty collection.
    Optional,
}

/// Run `op` until it succeeds, fails non-transiently, or `policy.max_try`
/// attempts have been made.
///
/// `op` is invoked exactly `max_try` times when every attempt fails
/// transiently. The backoff sleep is interrupted by `cancel`.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    reason: &str,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_try = policy.max_try.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        attempt += 1;

        let outcome = match tokio::time::timeout(policy.wait_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::WaitTimeout(policy.wait_timeout.as_millis() as u64)),
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => e,
        };

        if attempt >= max_try {
            tracing::warn!(reason = %reason, attempts = attempt, error = %err, "Retry budget exhausted");
            return Err(err.exhausted(reason, attempt));
        }

        tracing::debug!(
            reason = %reason,
            attempt,
            remaining = max_try - attempt,
            error = %err,
            "Transient failure, backing off"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            _ = tokio::time::sleep(policy.backoff) => {}
        }
    }
}

/// [`retry`] with the caller's [`Expectation`] applied to an exhausted budget.
pub async fn resolve<T, F, Fut>(
    policy: &RetryPolicy,
    reason: &str,
    expectation: Expectation,
    cancel: &CancellationToken,
    op: F,
) -> Result<Option<T>, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match retry(policy, reason, cancel, op).await {
        Ok(value) => Ok(Some(value)),
        Err(AppError::RetryExhausted { .. }) if expectation == Expectation::Optional => {
            tracing::debug!(reason = %reason, "Optional element never resolved");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    fn fast_policy(max_try: u32) -> RetryPolicy {
        RetryPolicy {
            backoff: Duration::from_millis(1),
            wait_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
        .with_max_try(max_try)
    }

    #[tokio::test]
    async fn always_transient_invoked_exactly_max_try_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry(
            &fast_policy(4),
            "Getting Skills",
            &CancellationToken::new(),
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::StaleElement("li".into()))
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(AppError::RetryExhausted {
                reason, attempts, ..
            }) => {
                assert_eq!(reason, "Getting Skills");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_propagates_unretried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry(&fast_policy(5), "lookup", &CancellationToken::new(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::ElementNotFound("#missing".into()))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(AppError::ElementNotFound(_))));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry(&fast_policy(3), "lookup", &CancellationToken::new(), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::StaleElement("li".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn slow_attempt_counts_as_wait_timeout() {
        let result: Result<(), _> = retry(&fast_policy(2), "slow", &CancellationToken::new(), || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        match result {
            Err(AppError::RetryExhausted { source, .. }) => {
                assert!(matches!(*source, AppError::WaitTimeout(50)));
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn optional_exhaustion_yields_none() {
        let found: Option<u8> = resolve(
            &fast_policy(2),
            "Finding Mutual Connections Link",
            Expectation::Optional,
            &CancellationToken::new(),
            || async { Err(AppError::WaitTimeout(1)) },
        )
        .await
        .unwrap();
        assert!(found.is_none());

        let err = resolve::<u8, _, _>(
            &fast_policy(2),
            "Getting Name",
            Expectation::Always,
            &CancellationToken::new(),
            || async { Err(AppError::WaitTimeout(1)) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::RetryExhausted { .. }));
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let policy = RetryPolicy {
            backoff: Duration::from_secs(60),
            ..fast_policy(3)
        };
        let trigger = cancel.clone();

        let result: Result<(), _> = retry(&policy, "lookup", &cancel, || {
            trigger.cancel();
            async { Err(AppError::StaleElement("li".into())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Cancelled)));
    }
}
