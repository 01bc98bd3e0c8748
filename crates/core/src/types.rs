//! Canonical data model shared by every crate in the workspace.
//!
//! All providers normalize into [`PriceSeries`]; everything downstream
//! (analytics, chart, persistence) consumes only these types.

use serde::{Deserialize, Serialize};

/// Minimum number of points a provider result must contain to count as a
/// successful fetch. Below this the result is treated as a failure and the
/// fallback chain moves on.
pub const MIN_ADEQUATE_POINTS: usize = 10;

/// The asset a prediction session is running against.
///
/// Supplied by the hosting UI from its selected-asset state and immutable
/// for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetQuery {
    /// Provider-facing identifier, e.g. "bitcoin".
    pub id: String,
    /// Ticker symbol, lowercase, e.g. "btc".
    pub symbol: String,
    /// Last known live price in USD.
    pub current_price: f64,
    /// 24h change in percent (may be negative).
    pub change_24h_percent: f64,
    /// Market capitalization in USD.
    pub market_cap: f64,
    /// 24h traded volume in USD.
    pub total_volume: f64,
    /// All-time high, when known.
    pub ath_price: Option<f64>,
    /// All-time low, when known.
    pub atl_price: Option<f64>,
}

impl AssetQuery {
    /// Lowercased id, falling back to the symbol when the id is empty.
    #[must_use]
    pub fn provider_id(&self) -> String {
        if self.id.is_empty() {
            self.symbol.to_lowercase()
        } else {
            self.id.to_lowercase()
        }
    }

    /// Lowercased ticker symbol.
    #[must_use]
    pub fn provider_symbol(&self) -> String {
        self.symbol.to_lowercase()
    }
}

/// Lookback window for a prediction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 30 minutes.
    M30,
    /// 1 hour.
    H1,
    /// 4 hours.
    H4,
    /// 24 hours.
    D1,
}

impl Timeframe {
    /// All timeframes in display order.
    pub const ALL: [Timeframe; 4] = [Timeframe::M30, Timeframe::H1, Timeframe::H4, Timeframe::D1];

    /// Length of the lookback window in milliseconds.
    #[must_use]
    pub fn lookback_ms(self) -> i64 {
        match self {
            Self::M30 => 30 * 60 * 1000,
            Self::H1 => 60 * 60 * 1000,
            Self::H4 => 4 * 60 * 60 * 1000,
            Self::D1 => 24 * 60 * 60 * 1000,
        }
    }

    /// Number of samples the synthetic generator emits for this timeframe.
    #[must_use]
    pub fn synthetic_points(self) -> usize {
        match self {
            Self::M30 => 30,
            Self::H1 => 60,
            Self::H4 => 48,
            Self::D1 => 24,
        }
    }

    /// Spacing between synthetic samples in milliseconds.
    #[must_use]
    pub fn synthetic_spacing_ms(self) -> i64 {
        match self {
            Self::M30 | Self::H1 => 60 * 1000,
            Self::H4 => 5 * 60 * 1000,
            Self::D1 => 60 * 60 * 1000,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::M30 => write!(f, "30m"),
            Self::H1 => write!(f, "1h"),
            Self::H4 => write!(f, "4h"),
            Self::D1 => write!(f, "24h"),
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "4h" => Ok(Self::H4),
            "24h" => Ok(Self::D1),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// One sample of the canonical time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Sample timestamp, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Price in USD, non-negative.
    pub price: f64,
}

impl PricePoint {
    #[must_use]
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        Self { timestamp_ms, price }
    }
}

/// Provider-agnostic time series: ordered points, strictly increasing
/// timestamps, never empty once a fetch path has succeeded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series from raw points, sorting by timestamp and dropping
    /// duplicate timestamps so the strictly-increasing invariant holds.
    #[must_use]
    pub fn from_points(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp_ms);
        points.dedup_by_key(|p| p.timestamp_ms);
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Prices only, in timestamp order.
    #[must_use]
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// The most recent `n` points (the whole series when shorter).
    #[must_use]
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// True when the series has enough points to count as a successful
    /// provider fetch.
    #[must_use]
    pub fn is_adequate(&self) -> bool {
        self.points.len() >= MIN_ADEQUATE_POINTS
    }

    /// Overwrites the last point's price. Used by the synthetic generator
    /// to pin the series to the live quote.
    pub fn pin_last_price(&mut self, price: f64) {
        if let Some(last) = self.points.last_mut() {
            last.price = price;
        }
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self::from_points(points)
    }
}
