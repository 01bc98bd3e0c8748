//! Pipeline-level errors.

use thiserror::Error;

use trendcast_core::{ProviderKind, SourceError};

/// Every provider failed on every scheduled attempt. The caller degrades
/// to synthetic data; this error never reaches the UI as a hard failure.
#[derive(Debug, Clone, Error)]
#[error("all providers exhausted after {attempts} attempts ({} failures)", failures.len())]
pub struct ExhaustedError {
    /// Number of full fallback-chain runs.
    pub attempts: u32,
    /// Per-provider failures in the order they occurred, across all
    /// attempts.
    pub failures: Vec<(ProviderKind, SourceError)>,
}
