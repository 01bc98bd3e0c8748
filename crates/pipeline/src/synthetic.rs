//! Synthetic series generation for the degraded path.
//!
//! When every provider is exhausted the session still needs a plausible
//! chart, so a random walk is synthesized around the asset's live quote:
//! it starts 5% below the quote, wanders with a volatility derived from
//! the 24h change, and always ends exactly at the quote.

use rand::Rng;

use trendcast_core::{AssetQuery, PricePoint, PriceSeries, Timeframe};

/// Fallback volatility when the asset carries no usable 24h change.
const DEFAULT_VOLATILITY: f64 = 0.02;
/// Starting price as a fraction of the live quote.
const START_FRACTION: f64 = 0.95;
/// Steps between re-rolls of the directional bias.
const BIAS_INTERVAL: usize = 10;

/// Generates a synthetic series ending at `now_ms` with the point count
/// and spacing of `timeframe`. The walk is driven entirely by `rng`, so
/// a seeded rng reproduces the same series.
#[must_use]
pub fn generate<R: Rng>(
    query: &AssetQuery,
    timeframe: Timeframe,
    now_ms: i64,
    rng: &mut R,
) -> PriceSeries {
    let points = timeframe.synthetic_points();
    let spacing = timeframe.synthetic_spacing_ms();

    let volatility = {
        let from_change = (query.change_24h_percent / 100.0).abs();
        if from_change.is_finite() && from_change > 0.0 {
            from_change
        } else {
            DEFAULT_VOLATILITY
        }
    };

    let mut price = query.current_price * START_FRACTION;
    let mut drift = 0.0;
    let mut samples = Vec::with_capacity(points);

    for i in 0..points {
        // Re-roll the directional bias every few steps so the walk forms
        // local trends instead of pure noise.
        if i % BIAS_INTERVAL == 0 {
            let bias = rng.gen::<f64>();
            drift = (bias - 0.5) * 0.01;
        }
        let change = (rng.gen::<f64>() - 0.5) * volatility + drift;
        price = (price * (1.0 + change)).max(0.01);

        let timestamp = now_ms - (points - 1 - i) as i64 * spacing;
        samples.push(PricePoint::new(timestamp, price));
    }

    let mut series = PriceSeries::from_points(samples);
    // The chart and the analyzer both treat the last point as "now", so
    // it must match the live quote exactly.
    series.pin_last_price(query.current_price);
    series
}
