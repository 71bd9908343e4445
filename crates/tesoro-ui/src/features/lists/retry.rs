//! Retry policy for list fetches.

use std::time::Duration;

use serde::Deserialize;

use crate::core::error::UiError;

/// Highest exponent applied to the base delay.
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Bounded exponential backoff for transient list-fetch failures.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Policy that surfaces the first failure.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay before retry number `retry` (zero-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.min(MAX_BACKOFF_EXPONENT));
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Delay to wait before retrying after `error` on `attempt` (zero-based),
    /// or `None` when the error should surface.
    #[must_use]
    pub fn next_delay(&self, attempt: u32, error: &UiError) -> Option<Duration> {
        (error.is_retryable() && attempt < self.max_retries).then(|| self.delay_for(attempt))
    }
}
