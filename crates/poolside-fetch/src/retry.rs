//! Fixed-delay retry combinator
//!
//! Works with any fallible async operation, including
//! [`RequestController::execute`](crate::RequestController::execute).
//! No state survives between calls.

use std::future::Future;
use std::time::Duration;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Retry every failure
    pub async fn run<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retry_if(operation, |_| true).await
    }

    /// Retry only failures accepted by `should_retry`
    ///
    /// A rejected failure is returned at once, without waiting.
    pub async fn retry_if<F, Fut, T, E, P>(&self, mut operation: F, mut should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < max_attempts && should_retry(&error) => {
                    tracing::debug!(attempt, max_attempts, delay = ?self.delay, "attempt failed, retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    tracing::debug!(attempt, max_attempts, "giving up");
                    return Err(error);
                }
            }
        }
    }
}

/// Invoke `operation` up to `max_attempts` times with a fixed `delay`
///
/// Resolves with the first success, or the last failure once attempts are
/// exhausted. Zero attempts is treated as one.
pub async fn with_retry<F, Fut, T, E>(operation: F, max_attempts: u32, delay: Duration) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryPolicy::new(max_attempts, delay).run(operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn flaky(failures: u32) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<u32, String>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let operation = move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if call <= failures {
                Err(format!("failure {}", call))
            } else {
                Ok(call)
            })
        };
        (calls, operation)
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let (calls, operation) = flaky(2);
        let started = Instant::now();

        let result = with_retry(operation, 3, Duration::from_millis(50)).await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_returns_last_failure_after_exhaustion() {
        let (calls, operation) = flaky(u32::MAX);

        let result = with_retry(operation, 3, Duration::from_millis(5)).await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let (calls, operation) = flaky(u32::MAX);
        let result = with_retry(operation, 0, Duration::from_millis(5)).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_predicate_stops_on_client_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<Value, RequestError> = RetryPolicy::new(5, Duration::from_millis(5))
            .retry_if(
                || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async {
                        Err(RequestError::Server {
                            status: 404,
                            message: "Plan not found".to_string(),
                            body: Value::Null,
                        })
                    }
                },
                RequestError::is_transient,
            )
            .await;

        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
