//! Error taxonomy for the acquisition pipeline.
//!
//! Provider-level errors are absorbed by the fallback chain; chain-level
//! exhaustion is absorbed by the retry scheduler's caller, which degrades
//! to synthetic data instead of surfacing a hard failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PriceSeries;

/// Identifies one external market-data source in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// History-by-id style API (CoinCap).
    CoinCap,
    /// Market-chart style API (CoinGecko).
    CoinGecko,
    /// Kline style API (Binance).
    Binance,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CoinCap => write!(f, "coincap"),
            Self::CoinGecko => write!(f, "coingecko"),
            Self::Binance => write!(f, "binance"),
        }
    }
}

/// Errors a single provider fetch can produce. All variants are
/// recoverable by falling through to the next provider.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SourceError {
    /// The request did not complete within the deadline.
    #[error("request timed out")]
    Timeout,

    /// The provider answered with a non-2xx status.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// The payload was missing the expected field/array or failed to parse.
    #[error("malformed payload")]
    MalformedPayload,

    /// The payload parsed but carried fewer points than the adequacy
    /// threshold.
    #[error("insufficient points: {0}")]
    InsufficientPoints(usize),
}

impl SourceError {
    /// True for errors caused by provider-side unavailability rather than
    /// a schema mismatch.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::HttpError(status) => *status >= 500 || *status == 429,
            Self::MalformedPayload | Self::InsufficientPoints(_) => false,
        }
    }
}

/// Result of one full run of the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The first adequate provider result, normalized.
    Success(PriceSeries),
    /// Every provider failed; errors in attempt order for diagnostics.
    Failure(Vec<(ProviderKind, SourceError)>),
}

impl FetchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Consumes the outcome, yielding the series on success.
    #[must_use]
    pub fn into_series(self) -> Option<PriceSeries> {
        match self {
            Self::Success(series) => Some(series),
            Self::Failure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_transient() {
        assert!(SourceError::Timeout.is_transient());
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(SourceError::HttpError(500).is_transient());
        assert!(SourceError::HttpError(503).is_transient());
        assert!(SourceError::HttpError(429).is_transient());
    }

    #[test]
    fn test_client_errors_are_not_transient() {
        assert!(!SourceError::HttpError(404).is_transient());
        assert!(!SourceError::MalformedPayload.is_transient());
        assert!(!SourceError::InsufficientPoints(5).is_transient());
    }

    #[test]
    fn test_display_includes_detail() {
        assert!(SourceError::HttpError(429).to_string().contains("429"));
        assert!(SourceError::InsufficientPoints(5).to_string().contains('5'));
    }
}
