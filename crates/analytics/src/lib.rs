//! Trend analysis over a canonical price series.
//!
//! [`analyze`] derives momentum, volatility, confidence and a bounded
//! price prediction from the most recent window of a series. The jitter
//! rng is the only stochastic input; inject a seeded rng to make the
//! output reproducible.

pub mod analyzer;

pub use analyzer::{analyze, ANALYSIS_WINDOW};
