//! CoinGecko-style provider: market chart keyed by coin id.
//!
//! Request: `GET /api/v3/coins/{id}/market_chart?vs_currency=usd&days={d}`
//! Response: `{ "prices": [ [<ms>, <price>], ... ] }`
//!
//! CoinGecko ids do not always match the ids other providers use, so the
//! client walks a small candidate list (id, symbol, "{symbol}-token",
//! "{id}-token") and returns the first adequate result.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use trendcast_core::{
    AssetQuery, PricePoint, PriceSeries, ProviderKind, SourceClient, SourceError, Timeframe,
    MIN_ADEQUATE_POINTS,
};

use crate::http;

/// CoinGecko production API base URL.
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com";

/// Configuration for the CoinGecko client.
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// Base URL for the API.
    pub base_url: String,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API_URL.to_string(),
        }
    }
}

impl CoinGeckoConfig {
    /// Sets the base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Maps a timeframe to the `days` query parameter. The API only takes
/// days, so the sub-day windows are fractional.
#[must_use]
pub fn days_param(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M30 => "0.021",
        Timeframe::H1 => "0.042",
        Timeframe::H4 => "0.17",
        Timeframe::D1 => "1",
    }
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[timestamp_ms, price]` pairs. Row shape is validated per row so a
    /// single bad entry is skipped rather than failing the payload.
    prices: Vec<Vec<serde_json::Value>>,
}

fn normalize(response: MarketChartResponse) -> Result<PriceSeries, SourceError> {
    let points: Vec<PricePoint> = response
        .prices
        .into_iter()
        .filter_map(|row| {
            let timestamp_ms = row.first()?.as_i64()?;
            let price = row.get(1)?.as_f64()?;
            if !price.is_finite() || price < 0.0 {
                return None;
            }
            Some(PricePoint::new(timestamp_ms, price))
        })
        .collect();

    if points.len() < MIN_ADEQUATE_POINTS {
        return Err(SourceError::InsufficientPoints(points.len()));
    }

    Ok(PriceSeries::from_points(points))
}

/// CoinGecko market-chart client.
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Client,
}

impl CoinGeckoClient {
    #[must_use]
    pub fn new(config: CoinGeckoConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
        }
    }

    /// Candidate ids in trial order, deduplicated.
    fn candidate_ids(query: &AssetQuery) -> Vec<String> {
        let id = query.provider_id();
        let symbol = query.provider_symbol();
        let mut candidates = vec![
            id.clone(),
            symbol.clone(),
            format!("{symbol}-token"),
            format!("{id}-token"),
        ];
        candidates.dedup();
        candidates
    }

    fn chart_url(&self, coin_id: &str, timeframe: Timeframe) -> String {
        format!(
            "{}/api/v3/coins/{}/market_chart?vs_currency=usd&days={}",
            self.config.base_url,
            coin_id,
            days_param(timeframe)
        )
    }

    async fn fetch_by_id(
        &self,
        coin_id: &str,
        timeframe: Timeframe,
        deadline: Duration,
    ) -> Result<PriceSeries, SourceError> {
        let url = self.chart_url(coin_id, timeframe);
        let response: MarketChartResponse = http::get_json(&self.http, &url, deadline).await?;
        normalize(response)
    }
}

#[async_trait]
impl SourceClient for CoinGeckoClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CoinGecko
    }

    async fn fetch(
        &self,
        query: &AssetQuery,
        timeframe: Timeframe,
        deadline: Duration,
    ) -> Result<PriceSeries, SourceError> {
        let mut last_err = SourceError::MalformedPayload;

        for coin_id in Self::candidate_ids(query) {
            match self.fetch_by_id(&coin_id, timeframe, deadline).await {
                Ok(series) => return Ok(series),
                Err(err) => {
                    tracing::debug!(%coin_id, error = %err, "candidate id failed");
                    last_err = err;
                }
            }
        }

        Err(last_err)
    }
}
