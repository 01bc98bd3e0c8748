//! Binance-style provider: klines keyed by trading pair.
//!
//! Request: `GET /api/v3/klines?symbol={SYMBOL}USDT&interval={code}&limit={n}`
//! Response: array of kline arrays; index 0 is the open time in ms, index 4
//! the close price as a decimal string.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use trendcast_core::{
    AssetQuery, PricePoint, PriceSeries, ProviderKind, SourceClient, SourceError, Timeframe,
    MIN_ADEQUATE_POINTS,
};

use crate::http;

/// Binance production API base URL.
pub const BINANCE_API_URL: &str = "https://api.binance.com";

/// Configuration for the Binance client.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// Base URL for the API.
    pub base_url: String,
    /// Quote asset appended to the ticker symbol.
    pub quote_asset: String,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_URL.to_string(),
            quote_asset: "USDT".to_string(),
        }
    }
}

impl BinanceConfig {
    /// Sets the base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Maps a timeframe to Binance's kline interval code.
#[must_use]
pub fn interval_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M30 => "30m",
        Timeframe::H1 => "1h",
        Timeframe::H4 => "4h",
        Timeframe::D1 => "1d",
    }
}

/// Number of klines requested per timeframe.
#[must_use]
pub fn kline_limit(timeframe: Timeframe) -> usize {
    match timeframe {
        Timeframe::M30 | Timeframe::H1 | Timeframe::H4 => 60,
        Timeframe::D1 => 24,
    }
}

type RawKlines = Vec<Vec<serde_json::Value>>;

fn normalize(klines: RawKlines) -> Result<PriceSeries, SourceError> {
    let points: Vec<PricePoint> = klines
        .into_iter()
        .filter_map(|kline| {
            let open_time_ms = kline.first()?.as_i64()?;
            let close = kline.get(4)?.as_str()?.parse::<f64>().ok()?;
            if !close.is_finite() || close < 0.0 {
                return None;
            }
            Some(PricePoint::new(open_time_ms, close))
        })
        .collect();

    if points.len() < MIN_ADEQUATE_POINTS {
        return Err(SourceError::InsufficientPoints(points.len()));
    }

    Ok(PriceSeries::from_points(points))
}

/// Binance kline client.
pub struct BinanceClient {
    config: BinanceConfig,
    http: Client,
}

impl BinanceClient {
    #[must_use]
    pub fn new(config: BinanceConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
        }
    }

    fn pair_symbol(&self, query: &AssetQuery) -> String {
        format!("{}{}", query.symbol.to_uppercase(), self.config.quote_asset)
    }

    fn klines_url(&self, pair: &str, timeframe: Timeframe) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.config.base_url,
            pair,
            interval_code(timeframe),
            kline_limit(timeframe)
        )
    }
}

#[async_trait]
impl SourceClient for BinanceClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Binance
    }

    async fn fetch(
        &self,
        query: &AssetQuery,
        timeframe: Timeframe,
        deadline: Duration,
    ) -> Result<PriceSeries, SourceError> {
        let pair = self.pair_symbol(query);
        let url = self.klines_url(&pair, timeframe);

        let klines: RawKlines = http::get_json(&self.http, &url, deadline).await?;
        normalize(klines)
    }
}
