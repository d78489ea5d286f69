//! Exponential backoff around a fallible async call

use crate::config::ExtractorConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retries an action with a doubling delay, no jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryingCaller {
    max_attempts: u32,
    initial_delay: Duration,
}

impl RetryingCaller {
    /// Create a caller. `max_attempts == 0` behaves as 1.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    /// Create a caller from the extraction configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.max_attempts, config.initial_retry_delay())
    }

    /// Attempts made before giving up
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `action` until it succeeds or the attempts are exhausted.
    ///
    /// The error of the last attempt is returned unchanged.
    pub async fn call<T, E, F, Fut>(&self, mut action: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match action().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= self.max_attempts => return Err(error),
                Err(error) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryingCaller {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}
