//! Restart backoff for the recognition session

use std::time::Duration;

use crate::config::RecognitionConfig;

/// Exponential restart delay with a hard error ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Base delay in milliseconds
    pub base_ms: u64,
    /// Maximum delay in milliseconds
    pub cap_ms: u64,
    /// Consecutive errors tolerated before giving up
    pub max_errors: u32,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            base_ms: 1000,
            cap_ms: 10_000,
            max_errors: 5,
        }
    }
}

impl RestartPolicy {
    #[must_use]
    pub const fn from_config(config: &RecognitionConfig) -> Self {
        Self {
            base_ms: config.backoff_base_ms,
            cap_ms: config.backoff_cap_ms,
            max_errors: config.max_errors,
        }
    }

    /// Delay before restarting after `error_count` consecutive errors
    ///
    /// `min(base * 2^error_count, cap)`
    #[must_use]
    pub fn delay_for(&self, error_count: u32) -> Duration {
        let factor = 1u64.checked_shl(error_count).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_ms.saturating_mul(factor).min(self.cap_ms))
    }

    /// Whether the session should halt instead of retrying
    #[must_use]
    pub const fn exhausted(&self, error_count: u32) -> bool {
        error_count >= self.max_errors
    }
}
