//! Momentum/volatility/confidence scoring.

use rand::Rng;

use trendcast_core::{PredictionResult, PriceSeries, Trend};

/// Number of most-recent points the analysis window covers.
pub const ANALYSIS_WINDOW: usize = 20;

/// Volatility assumed when the window carries fewer than two returns.
const DEFAULT_VOLATILITY: f64 = 0.02;

/// Analyzes the most recent [`ANALYSIS_WINDOW`] points of `series`.
///
/// Never fails: an empty series yields [`PredictionResult::neutral`].
/// All percentage fields are ×100 of their fractional form; bounded
/// fields are clamped to their documented ranges.
pub fn analyze<R: Rng>(series: &PriceSeries, rng: &mut R) -> PredictionResult {
    let window = series.tail(ANALYSIS_WINDOW);

    let Some(last) = window.last() else {
        tracing::warn!("empty series, returning neutral prediction");
        return PredictionResult::neutral(0.0);
    };
    let first = &window[0];
    let last_price = last.price;

    let returns = step_returns(window);

    let avg_change = mean(&returns).unwrap_or(0.0);
    let volatility = if returns.len() < 2 {
        DEFAULT_VOLATILITY
    } else {
        population_stdev(&returns, avg_change)
    };

    let trend = if last_price > first.price {
        Trend::Bullish
    } else {
        Trend::Bearish
    };

    // Momentum: did the second half of the window move faster than the
    // first half?
    let split = returns.len() / 2;
    let first_half_avg = mean(&returns[..split]).unwrap_or(0.0);
    let second_half_avg = mean(&returns[split..]).unwrap_or(0.0);
    let momentum = second_half_avg - first_half_avg;

    let trend_consistency = if returns.is_empty() {
        0.0
    } else {
        let matching = returns
            .iter()
            .filter(|r| match trend {
                Trend::Bullish => **r > 0.0,
                Trend::Bearish => **r < 0.0,
            })
            .count();
        matching as f64 / returns.len() as f64
    };

    let confidence = (trend_consistency * 100.0 - volatility * 500.0)
        .round()
        .clamp(60.0, 95.0);

    // Jitter is the only stochastic term; callers seed the rng for
    // reproducible output.
    let jitter = (rng.gen::<f64>() - 0.5) * volatility * 2.0;
    let predicted_change = avg_change * 5.0 + momentum * 10.0 + jitter;
    let predicted_price = (last_price * (1.0 + predicted_change)).max(0.0);

    let window_min = window.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let window_max = window.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    let support = window_min * (1.0 - volatility);
    let resistance = window_max * (1.0 + volatility);

    let increase_probability =
        (50.0 + momentum * 500.0 + avg_change * 300.0).round().clamp(1.0, 99.0) as u8;
    let risk_score = (volatility * 100.0).round().clamp(1.0, 10.0) as u8;

    PredictionResult {
        trend,
        confidence_percent: confidence,
        predicted_price,
        volatility_percent: volatility * 100.0,
        avg_change_percent: avg_change * 100.0,
        momentum_percent: momentum * 100.0,
        support,
        resistance,
        risk_score,
        increase_probability_percent: increase_probability,
    }
}

/// Per-step fractional returns, skipping steps with a non-positive base
/// (those would blow up the ratio).
fn step_returns(window: &[trendcast_core::PricePoint]) -> Vec<f64> {
    window
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].price;
            let curr = pair[1].price;
            if prev <= 0.0 {
                return None;
            }
            let r = (curr - prev) / prev;
            r.is_finite().then_some(r)
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn population_stdev(values: &[f64], mean: f64) -> f64 {
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
