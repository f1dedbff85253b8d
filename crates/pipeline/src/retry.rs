//! Retry policy with exponential backoff

use std::time::Duration;

use flightfeed_config::RetryConfig;

/// Exponent cap so the multiplier never overflows
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = fail fast)
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Policy with fixed retry count and delays
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before retry `attempt` (0-based): `base * 2^attempt`, capped
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_BACKOFF_SHIFT);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.base_delay, config.max_delay)
    }
}
