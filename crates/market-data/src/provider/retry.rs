use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};

/// Bounded retry with exponential backoff.
///
/// Only [`RetryClass::WithBackoff`] errors (rate limiting, timeouts) are
/// retried; anything else is returned straight away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before the retry that follows zero-based `attempt`:
    /// `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, MarketDataError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.retry_class() == RetryClass::WithBackoff && attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed on attempt {}/{}: {}; retrying in {:?}",
                        label,
                        attempt + 1,
                        attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    debug!("{} gave up after {} attempt(s): {}", label, attempt + 1, err);
                    return Err(err);
                }
            }
        }
    }
}
