//! CoinCap-style provider: price history keyed by asset id.
//!
//! Request: `GET /v2/assets/{id}/history?interval={code}&start={ms}&end={ms}`
//! Response: `{ "data": [ { "time": <ms>, "priceUsd": "<decimal string>" } ] }`
//!
//! The API accepts either the asset id ("bitcoin") or the lowercase symbol
//! ("btc") as the path key; when the id-keyed request fails with a status
//! error the client retries once with the symbol before reporting it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use trendcast_core::{
    AssetQuery, PricePoint, PriceSeries, ProviderKind, SourceClient, SourceError, Timeframe,
    MIN_ADEQUATE_POINTS,
};

use crate::http;

/// CoinCap production API base URL.
pub const COINCAP_API_URL: &str = "https://api.coincap.io";

/// Configuration for the CoinCap client.
#[derive(Debug, Clone)]
pub struct CoinCapConfig {
    /// Base URL for the API.
    pub base_url: String,
}

impl Default for CoinCapConfig {
    fn default() -> Self {
        Self {
            base_url: COINCAP_API_URL.to_string(),
        }
    }
}

impl CoinCapConfig {
    /// Sets the base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Maps a timeframe to CoinCap's history interval code.
#[must_use]
pub fn interval_code(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::M30 => "m1",
        Timeframe::H1 => "m5",
        Timeframe::H4 => "m15",
        Timeframe::D1 => "m30",
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    data: Vec<RawHistoryPoint>,
}

/// One raw history row. Fields are optional so a single bad row degrades
/// to a skip instead of failing the whole payload.
#[derive(Debug, Deserialize)]
struct RawHistoryPoint {
    time: Option<i64>,
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
}

impl RawHistoryPoint {
    fn into_point(self) -> Option<PricePoint> {
        let timestamp_ms = self.time?;
        let price = self.price_usd?.parse::<f64>().ok()?;
        if !price.is_finite() || price < 0.0 {
            return None;
        }
        Some(PricePoint::new(timestamp_ms, price))
    }
}

fn normalize(response: HistoryResponse) -> Result<PriceSeries, SourceError> {
    let points: Vec<PricePoint> = response
        .data
        .into_iter()
        .filter_map(RawHistoryPoint::into_point)
        .collect();

    if points.len() < MIN_ADEQUATE_POINTS {
        return Err(SourceError::InsufficientPoints(points.len()));
    }

    Ok(PriceSeries::from_points(points))
}

/// CoinCap history client.
pub struct CoinCapClient {
    config: CoinCapConfig,
    http: Client,
}

impl CoinCapClient {
    #[must_use]
    pub fn new(config: CoinCapConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
        }
    }

    fn history_url(&self, asset_key: &str, timeframe: Timeframe, start_ms: i64, end_ms: i64) -> String {
        format!(
            "{}/v2/assets/{}/history?interval={}&start={}&end={}",
            self.config.base_url,
            asset_key,
            interval_code(timeframe),
            start_ms,
            end_ms
        )
    }

    async fn fetch_by_key(
        &self,
        asset_key: &str,
        timeframe: Timeframe,
        deadline: Duration,
    ) -> Result<PriceSeries, SourceError> {
        let end_ms = Utc::now().timestamp_millis();
        let start_ms = end_ms - timeframe.lookback_ms();
        let url = self.history_url(asset_key, timeframe, start_ms, end_ms);

        let response: HistoryResponse = http::get_json(&self.http, &url, deadline).await?;
        normalize(response)
    }
}

#[async_trait]
impl SourceClient for CoinCapClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CoinCap
    }

    async fn fetch(
        &self,
        query: &AssetQuery,
        timeframe: Timeframe,
        deadline: Duration,
    ) -> Result<PriceSeries, SourceError> {
        let id = query.provider_id();
        let symbol = query.provider_symbol();

        match self.fetch_by_key(&id, timeframe, deadline).await {
            Ok(series) => Ok(series),
            // The API rejects some assets under their id but serves them
            // under the ticker symbol; only a status error warrants the
            // second attempt.
            Err(id_err @ SourceError::HttpError(_)) if symbol != id => {
                tracing::debug!(%id, error = %id_err, "id-keyed request failed, retrying with symbol");
                self.fetch_by_key(&symbol, timeframe, deadline).await
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> AssetQuery {
        AssetQuery {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            current_price: 50000.0,
            change_24h_percent: 2.0,
            market_cap: 0.0,
            total_volume: 0.0,
            ath_price: None,
            atl_price: None,
        }
    }

    fn client(server: &MockServer) -> CoinCapClient {
        CoinCapClient::new(CoinCapConfig::default().with_base_url(server.uri()))
    }

    fn history_body(n: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "time": 1_700_000_000_000i64 + (i as i64) * 60_000,
                    "priceUsd": format!("{}", 50000.0 + i as f64),
                })
            })
            .collect();
        serde_json::json!({ "data": data })
    }

    const DEADLINE: Duration = Duration::from_secs(5);

    #[test]
    fn test_interval_codes() {
        assert_eq!(interval_code(Timeframe::M30), "m1");
        assert_eq!(interval_code(Timeframe::H1), "m5");
        assert_eq!(interval_code(Timeframe::H4), "m15");
        assert_eq!(interval_code(Timeframe::D1), "m30");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/assets/bitcoin/history"))
            .and(query_param("interval", "m5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(12)))
            .mount(&server)
            .await;

        let series = client(&server)
            .fetch(&query(), Timeframe::H1, DEADLINE)
            .await
            .unwrap();
        assert_eq!(series.len(), 12);
        assert_eq!(series.first().unwrap().price, 50000.0);
    }

    #[tokio::test]
    async fn test_fetch_insufficient_points() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(5)))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch(&query(), Timeframe::H1, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::InsufficientPoints(5));
    }

    #[tokio::test]
    async fn test_fetch_skips_malformed_rows() {
        let server = MockServer::start().await;
        let mut body = history_body(11);
        body["data"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({ "time": null, "priceUsd": "oops" }));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let series = client(&server)
            .fetch(&query(), Timeframe::H1, DEADLINE)
            .await
            .unwrap();
        assert_eq!(series.len(), 11);
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_symbol_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/assets/bitcoin/history"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/assets/btc/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(history_body(15)))
            .mount(&server)
            .await;

        let series = client(&server)
            .fetch(&query(), Timeframe::H1, DEADLINE)
            .await
            .unwrap();
        assert_eq!(series.len(), 15);
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch(&query(), Timeframe::H1, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::HttpError(500));
    }

    #[tokio::test]
    async fn test_fetch_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "nope": [] })))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch(&query(), Timeframe::H1, DEADLINE)
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::MalformedPayload);
    }

    #[tokio::test]
    async fn test_fetch_deadline_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(history_body(12))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch(&query(), Timeframe::H1, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::Timeout);
    }
}
