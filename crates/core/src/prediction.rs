//! Prediction output and persisted record types.

use serde::{Deserialize, Serialize};

use crate::types::Timeframe;

/// Detected direction of the analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

/// Output of the trend analyzer for the UI summary panel and the chart
/// overlay. Every field is finite and bounded as documented; a failed or
/// short analysis yields [`PredictionResult::neutral`], never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub trend: Trend,
    /// In [60, 95].
    pub confidence_percent: f64,
    pub predicted_price: f64,
    /// Population stdev of window returns, ×100.
    pub volatility_percent: f64,
    /// Mean window return, ×100.
    pub avg_change_percent: f64,
    /// Second-half mean return minus first-half mean return, ×100.
    pub momentum_percent: f64,
    pub support: f64,
    pub resistance: f64,
    /// In [1, 10].
    pub risk_score: u8,
    /// In [1, 99].
    pub increase_probability_percent: u8,
}

impl PredictionResult {
    /// Neutral defaults for when the series is too short to analyze.
    /// Confidence sits at the lower bound and the increase probability at
    /// the 50% coin-flip.
    #[must_use]
    pub fn neutral(last_price: f64) -> Self {
        Self {
            trend: Trend::Bullish,
            confidence_percent: 60.0,
            predicted_price: last_price,
            volatility_percent: 2.0,
            avg_change_percent: 0.0,
            momentum_percent: 0.0,
            support: last_price,
            resistance: last_price,
            risk_score: 2,
            increase_probability_percent: 50,
        }
    }

    /// True when every bounded field sits inside its documented range and
    /// nothing is NaN or infinite.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let finite = [
            self.confidence_percent,
            self.predicted_price,
            self.volatility_percent,
            self.avg_change_percent,
            self.momentum_percent,
            self.support,
            self.resistance,
        ]
        .iter()
        .all(|v| v.is_finite());

        finite
            && (60.0..=95.0).contains(&self.confidence_percent)
            && (1..=10).contains(&self.risk_score)
            && (1..=99).contains(&self.increase_probability_percent)
    }
}

/// Resolved outcome of a prediction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Profit,
    Loss,
}

/// One resolved prediction, appended to the external log keyed by asset.
/// Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub asset_id: String,
    pub asset_symbol: String,
    pub timeframe: Timeframe,
    /// Resolution time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub initial_price: f64,
    pub final_price: f64,
    pub percentage_change: f64,
    pub outcome: Outcome,
}

impl PredictionRecord {
    /// True when the record belongs to the given asset (by id or symbol).
    #[must_use]
    pub fn matches_asset(&self, id: &str, symbol: &str) -> bool {
        self.asset_id == id || self.asset_symbol == symbol
    }
}

/// Which summary panel the UI is showing. A single discriminant instead of
/// independent booleans so the panels stay mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewState {
    #[default]
    Details,
    Stats,
    Probability,
}
