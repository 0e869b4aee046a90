// Retry configuration with exponential backoff

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a retry controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Base delay between attempts, in milliseconds
    pub retry_delay_ms: u64,
    pub exponential_backoff: bool,
    /// Upper bound for the backoff delay, in milliseconds
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Create a new retry configuration with the default delays
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            retry_delay_ms: 2000,
            exponential_backoff: true,
            max_delay_ms: 10_000,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// The base delay as a `Duration`
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Calculate the cooldown that follows a given attempt.
    ///
    /// `attempt` is 1 for the first attempt: backoff yields
    /// `retry_delay * 2^(attempt-1)`, capped at `max_delay`. Without backoff
    /// the base delay is returned unconditionally.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.retry_delay();
        }

        let factor = 2u64
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay_ms = self.retry_delay_ms.saturating_mul(factor);

        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
