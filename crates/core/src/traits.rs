//! Seams between the pipeline and its collaborators.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ProviderKind, SourceError};
use crate::types::{AssetQuery, PriceSeries, Timeframe};

/// One external market-data source. Implementations perform a single timed
/// fetch and normalize the payload; they hold no shared mutable state.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which provider this client talks to.
    fn kind(&self) -> ProviderKind;

    /// Fetches and normalizes one series, enforcing `deadline` by racing
    /// the request against a timer.
    async fn fetch(
        &self,
        query: &AssetQuery,
        timeframe: Timeframe,
        deadline: Duration,
    ) -> Result<PriceSeries, SourceError>;
}

/// Key-value persistence capability the core depends on via injection.
/// The hosting UI backs this with whatever local storage it has.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}
