//! Exponential-backoff retry around the fallback chain.

use trendcast_core::{AssetQuery, FetchOutcome, PriceSeries, SessionConfig, Timeframe};

use crate::error::ExhaustedError;
use crate::fallback::FallbackCoordinator;

/// Re-runs the whole fallback chain with exponential backoff between
/// runs. Backoff applies between chain runs only, never between
/// providers inside one run.
pub struct RetryScheduler {
    coordinator: FallbackCoordinator,
    config: SessionConfig,
}

impl RetryScheduler {
    #[must_use]
    pub fn new(coordinator: FallbackCoordinator, config: SessionConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Fetches a series, retrying the full chain up to
    /// `config.max_attempts` times. No sleep follows the final attempt.
    pub async fn fetch(
        &self,
        query: &AssetQuery,
        timeframe: Timeframe,
    ) -> Result<PriceSeries, ExhaustedError> {
        let mut all_failures = Vec::new();

        for attempt in 1..=self.config.max_attempts {
            match self.coordinator.resolve(query, timeframe).await {
                FetchOutcome::Success(series) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "chain recovered on retry");
                    }
                    return Ok(series);
                }
                FetchOutcome::Failure(failures) => {
                    all_failures.extend(failures);
                    if attempt < self.config.max_attempts {
                        let backoff = self.config.backoff_after(attempt);
                        tracing::warn!(
                            attempt,
                            backoff_secs = backoff.as_secs(),
                            "chain exhausted, backing off before retry"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(ExhaustedError {
            attempts: self.config.max_attempts,
            failures: all_failures,
        })
    }
}
