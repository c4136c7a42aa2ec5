//! Bounded immediate retry
//!
//! The caller decides which failures are transient through a predicate, so
//! the outcome distinguishes "gave up after the budget" from "failed with a
//! non-retryable error on attempt N".

use std::future::Future;
use thiserror::Error;

/// Options for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Sequential attempts with no delay between them
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_publisher::core::RetryPolicy;
    ///
    /// let policy = RetryPolicy::immediate(10);
    /// assert_eq!(policy.max_attempts, 10);
    /// ```
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }
}

/// Terminal outcome of a retried operation
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt failed with a retryable error
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },

    /// An attempt failed with an error the predicate rejected
    #[error("attempt {attempt} failed: {error}")]
    NonRetryable {
        attempt: u32,
        #[source]
        error: E,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::NonRetryable { attempt, .. } => *attempt,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// The last underlying error
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::NonRetryable { error, .. } => error,
        }
    }
}

/// Retry manager executing an async operation under a [`RetryPolicy`]
///
/// # Examples
///
/// ```no_run
/// use doc_publisher::core::{RetryManager, RetryPolicy};
///
/// # async fn example() {
/// let manager = RetryManager::new(RetryPolicy::immediate(10));
///
/// let result = manager
///     .retry(
///         |error: &std::io::Error| error.kind() == std::io::ErrorKind::Interrupted,
///         |_attempt| async { Ok::<_, std::io::Error>(42) },
///     )
///     .await;
///
/// assert_eq!(result.unwrap(), 42);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetryManager {
    policy: RetryPolicy,
}

impl RetryManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Execute `operation` until it succeeds, fails with an error that
    /// `is_retryable` rejects, or the attempt budget runs out.
    ///
    /// The operation receives the 1-based attempt number.
    pub async fn retry<F, Fut, T, E, P>(
        &self,
        is_retryable: P,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::error::Error + 'static,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };

            if !is_retryable(&error) {
                return Err(RetryError::NonRetryable { attempt, error });
            }

            if attempt >= max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }

            tracing::warn!(attempt, max_attempts, error = %error, "attempt failed, retrying");

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient(error: &Error) -> bool {
        error.kind() == ErrorKind::ConnectionReset
    }

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let manager = RetryManager::new(RetryPolicy::immediate(10));

        let result = manager
            .retry(transient, |_| async { Ok::<_, Error>(42) })
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let manager = RetryManager::new(RetryPolicy::immediate(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(transient, move |_| {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 4 {
                        Err(Error::new(ErrorKind::ConnectionReset, "reset"))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_retry_max_attempts_reached() {
        let manager = RetryManager::new(RetryPolicy::immediate(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(transient, move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::new(ErrorKind::ConnectionReset, "reset")) }
            })
            .await;

        let error = result.unwrap_err();
        assert!(error.is_exhausted());
        assert_eq!(error.attempts(), 10);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let manager = RetryManager::new(RetryPolicy::immediate(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(transient, move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Error::new(ErrorKind::PermissionDenied, "denied")) }
            })
            .await;

        let error = result.unwrap_err();
        assert!(!error.is_exhausted());
        assert_eq!(error.attempts(), 1);
        assert_eq!(error.into_inner().kind(), ErrorKind::PermissionDenied);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_operation_receives_attempt_number() {
        let manager = RetryManager::new(RetryPolicy::immediate(3));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _ = manager
            .retry(transient, move |attempt| {
                seen_clone.lock().unwrap().push(attempt);
                async { Err::<(), _>(Error::new(ErrorKind::ConnectionReset, "reset")) }
            })
            .await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_immediate_policy_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
    }
}
