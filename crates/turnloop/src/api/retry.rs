//! Automatic retry with exponential backoff and jitter.
//!
//! Retries transient model errors (429, 500, 502, 503, 504, transport
//! failures, timeouts) with configurable exponential backoff. Never retries
//! 4xx client errors or malformed responses. See [`ModelError::is_transient`].

use crate::error::ModelError;
use crate::model::{ModelClient, ModelFuture, ModelRequest};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (0 = no retries, just fail immediately).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier (typically 2.0 for exponential backoff).
    pub multiplier: f64,
    /// Scale delays down by a per-attempt factor.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with the given number of retries.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());

        if self.jitter {
            // Deterministic factors keep tests reproducible without a RNG.
            let jitter_factor = match attempt % 4 {
                0 => 0.75,
                1 => 0.90,
                2 => 0.60,
                _ => 0.85,
            };
            Duration::from_secs_f64(capped * jitter_factor)
        } else {
            Duration::from_secs_f64(capped)
        }
    }
}

/// Retry an async model call while its error is transient.
pub async fn retry_model_call<T, F, Fut>(config: &RetryConfig, mut call: F) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < config.max_retries && e.is_transient() => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "Transient model error (attempt {}/{}): {e}. Retrying in {delay:?}...",
                    attempt + 1,
                    config.max_retries,
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// A [`ModelClient`] that retries its inner client on transient errors.
///
/// The session's model timeout bounds the whole retry sequence, not each
/// attempt.
pub struct RetryingClient<C> {
    inner: C,
    config: RetryConfig,
}

impl<C: ModelClient> RetryingClient<C> {
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: ModelClient> ModelClient for RetryingClient<C> {
    fn respond<'a>(&'a self, request: ModelRequest<'a>) -> ModelFuture<'a> {
        Box::pin(retry_model_call(&self.config, move || {
            self.inner.respond(request)
        }))
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Completion;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::with_retries(retries)
        }
    }

    struct Flaky {
        outcomes: Mutex<VecDeque<Result<Completion, ModelError>>>,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(outcomes: Vec<Result<Completion, ModelError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            }
        }
    }

    impl ModelClient for Flaky {
        fn respond<'a>(&'a self, _request: ModelRequest<'a>) -> ModelFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ModelError::EmptyResponse));
            Box::pin(async move { next })
        }
    }

    fn request() -> ModelRequest<'static> {
        ModelRequest {
            transcript: &[],
            tools: &[],
        }
    }

    fn unavailable() -> ModelError {
        ModelError::Http {
            status: 503,
            body: "unavailable".into(),
        }
    }

    #[test]
    fn default_config_no_retries() {
        assert_eq!(RetryConfig::default().max_retries, 0);
        assert_eq!(RetryConfig::with_retries(3).max_retries, 3);
    }

    #[test]
    fn delay_increases_exponentially() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::with_retries(5)
        };
        let d0 = config.delay_for_attempt(0);
        let d1 = config.delay_for_attempt(1);
        let d2 = config.delay_for_attempt(2);
        assert!(d1 > d0, "d1={d1:?} should be > d0={d0:?}");
        assert!(d2 > d1, "d2={d2:?} should be > d1={d1:?}");
    }

    #[test]
    fn delay_capped_at_max() {
        let config = RetryConfig {
            jitter: false,
            max_delay: Duration::from_secs(2),
            ..RetryConfig::with_retries(10)
        };
        assert!(config.delay_for_attempt(10) <= Duration::from_secs(2));
    }

    #[test]
    fn jitter_reduces_delay() {
        let jittered = RetryConfig::with_retries(3);
        let plain = RetryConfig {
            jitter: false,
            ..RetryConfig::with_retries(3)
        };
        assert!(jittered.delay_for_attempt(2) <= plain.delay_for_attempt(2));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let client = RetryingClient::new(
            Flaky::new(vec![
                Err(unavailable()),
                Err(ModelError::Transport("connection reset".into())),
                Ok(Completion::text("done")),
            ]),
            fast(3),
        );
        let completion = client.respond(request()).await.unwrap();
        assert_eq!(completion, Completion::text("done"));
        assert_eq!(client.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let unauthorized = ModelError::Http {
            status: 401,
            body: "bad key".into(),
        };
        let client = RetryingClient::new(
            Flaky::new(vec![Err(unauthorized.clone()), Ok(Completion::text("x"))]),
            fast(3),
        );
        assert_eq!(client.respond(request()).await, Err(unauthorized));
        assert_eq!(client.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let client = RetryingClient::new(
            Flaky::new(vec![
                Err(unavailable()),
                Err(unavailable()),
                Err(unavailable()),
            ]),
            fast(1),
        );
        assert_eq!(client.respond(request()).await, Err(unavailable()));
        assert_eq!(client.inner().calls.load(Ordering::SeqCst), 2);
    }
}
