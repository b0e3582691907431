//! Bounded retry policy for extraction calls.

use std::time::Duration;

use super::config::AppConfig;
use crate::extraction::ExtractionError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per image, first try included
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each later one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.backoff_base(),
        }
    }

    /// Whether a job that has made `attempts_made` attempts and just failed
    /// with `error` gets another one.
    pub fn should_retry(&self, attempts_made: u32, error: &ExtractionError) -> bool {
        error.is_retryable() && attempts_made < self.max_attempts
    }

    /// Pause before the next attempt, given how many have been made.
    /// 1 → base, 2 → 2×base, 3 → 4×base, …
    pub fn backoff(&self, attempts_made: u32) -> Duration {
        let exponent = attempts_made.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}
