//! Session-wide tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one prediction session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Per-provider fetch deadline in milliseconds.
    pub fetch_deadline_ms: u64,
    /// Full fallback-chain runs before degrading to synthetic data.
    pub max_attempts: u32,
    /// Base of the exponential backoff between attempts, in seconds.
    pub backoff_base_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fetch_deadline_ms: 5000,
            max_attempts: 3,
            backoff_base_secs: 2,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn fetch_deadline(&self) -> Duration {
        Duration::from_millis(self.fetch_deadline_ms)
    }

    /// Backoff before attempt `n + 1`, with `n` starting at 1 after the
    /// first failure: 2 s, 4 s, 8 s, ...
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_base_secs.saturating_pow(attempt))
    }

    #[must_use]
    pub fn with_fetch_deadline_ms(mut self, ms: u64) -> Self {
        self.fetch_deadline_ms = ms;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }
}
