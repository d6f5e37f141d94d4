//! A bounded retry with a fixed delay between attempts.

use crate::Result;
use std::future::Future;
use std::time::Duration;
use tracing::error;

/// How many times to try an operation and how long to wait between tries. There is no backoff:
/// every wait is `delay`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Runs `op` until it succeeds or `max_attempts` have failed, returning the last error. Each
    /// failure is logged with `what` and the attempt number.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!("Attempt {attempt}/{max_attempts} - Error {what}: {e:#}");
                    if attempt >= max_attempts {
                        error!("All retries failed");
                        return Err(e);
                    }
                }
            }
            attempt += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}
