//! Retry decorator for transient failures.
//!
//! [`with_retry`] re-runs an async operation while it fails with a transient
//! error and attempts remain, sleeping [`RetryPolicy::backoff`] between
//! attempts. Non-transient errors return immediately.

use crate::config::RetryPolicy;
use crate::ports::agent::AgentError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Errors the decorator knows how to classify
pub trait Retryable: std::fmt::Display {
    fn is_transient(&self) -> bool;
}

impl Retryable for AgentError {
    fn is_transient(&self) -> bool {
        AgentError::is_transient(self)
    }
}

/// Final result plus the number of attempts it took
#[derive(Debug)]
pub struct Attempted<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Run `operation` under `policy`.
///
/// `operation` receives the 1-based attempt number. `on_retry` is called
/// with the attempt that just failed, its error and the delay before the
/// next one.
pub async fn with_retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    mut on_retry: R,
) -> Attempted<T, E>
where
    E: Retryable,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(u32, &E, Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt,
                };
            }
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                debug!(attempt, ?delay, "Transient failure, retrying: {}", error);
                on_retry(attempt, &error, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                return Attempted {
                    result: Err(error),
                    attempts: attempt,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing(times: u32, error: AgentError) -> impl FnMut(u32) -> std::future::Ready<Result<&'static str, AgentError>> {
        let calls = Arc::new(AtomicU32::new(0));
        move |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < times {
                Err(error.clone())
            } else {
                Ok("done")
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_then_success() {
        let start = tokio::time::Instant::now();
        let mut delays = Vec::new();
        let outcome = with_retry(
            &RetryPolicy::default(),
            failing(2, AgentError::Timeout),
            |_, _, d| delays.push(d),
        )
        .await;
        assert_eq!(outcome.result.unwrap(), "done");
        assert_eq!(outcome.attempts, 3);
        assert_eq!(delays, vec![Duration::from_secs(2), Duration::from_secs(4)]);
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_capped() {
        let outcome = with_retry(
            &RetryPolicy::default(),
            failing(10, AgentError::RateLimited("429".into())),
            |_, _, _| {},
        )
        .await;
        assert_eq!(outcome.attempts, 3);
        assert!(matches!(outcome.result, Err(AgentError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_non_transient_is_not_retried() {
        let mut retries = 0;
        let outcome = with_retry(
            &RetryPolicy::default(),
            failing(1, AgentError::Malformed("garbage".into())),
            |_, _, _| retries += 1,
        )
        .await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(retries, 0);
        assert!(matches!(outcome.result, Err(AgentError::Malformed(_))));
    }
}
