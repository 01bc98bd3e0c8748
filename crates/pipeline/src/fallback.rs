//! Sequential provider fallback.

use std::sync::Arc;
use std::time::Duration;

use trendcast_core::{AssetQuery, FetchOutcome, SourceClient, Timeframe};

/// Walks an ordered chain of providers and returns the first adequate
/// series. Providers are tried strictly in order, one at a time, and a
/// provider is never revisited within a single resolve.
pub struct FallbackCoordinator {
    clients: Vec<Arc<dyn SourceClient>>,
    deadline: Duration,
}

impl FallbackCoordinator {
    #[must_use]
    pub fn new(clients: Vec<Arc<dyn SourceClient>>, deadline: Duration) -> Self {
        Self { clients, deadline }
    }

    /// Runs the chain once. Success short-circuits; a full walk with no
    /// adequate result yields the collected failures in attempt order.
    pub async fn resolve(&self, query: &AssetQuery, timeframe: Timeframe) -> FetchOutcome {
        let mut failures = Vec::new();

        for client in &self.clients {
            let kind = client.kind();
            tracing::debug!(provider = %kind, asset = %query.provider_id(), %timeframe, "trying provider");

            match client.fetch(query, timeframe, self.deadline).await {
                Ok(series) => {
                    tracing::info!(
                        provider = %kind,
                        points = series.len(),
                        "provider returned adequate series"
                    );
                    return FetchOutcome::Success(series);
                }
                Err(err) => {
                    tracing::warn!(provider = %kind, %err, "provider failed, falling through");
                    failures.push((kind, err));
                }
            }
        }

        FetchOutcome::Failure(failures)
    }
}
