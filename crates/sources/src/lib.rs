//! Provider clients for the trendcast acquisition pipeline.
//!
//! Three external sources, each with its own schema, normalized into the
//! canonical [`trendcast_core::PriceSeries`]:
//!
//! - [`coincap`]: history-by-id style (`/v2/assets/{id}/history`)
//! - [`coingecko`]: market-chart style (`/api/v3/coins/{id}/market_chart`)
//! - [`binance`]: kline style (`/api/v3/klines`)
//!
//! Every client enforces its deadline by racing the request against
//! `tokio::time::timeout` and maps failures into the shared
//! [`trendcast_core::SourceError`] taxonomy.

pub mod binance;
pub mod coincap;
pub mod coingecko;
mod http;

pub use binance::{BinanceClient, BinanceConfig};
pub use coincap::{CoinCapClient, CoinCapConfig};
pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};

use std::sync::Arc;

use trendcast_core::SourceClient;

/// The fixed priority order of the fallback chain: CoinCap, then
/// CoinGecko, then Binance.
#[must_use]
pub fn default_chain() -> Vec<Arc<dyn SourceClient>> {
    vec![
        Arc::new(CoinCapClient::new(CoinCapConfig::default())),
        Arc::new(CoinGeckoClient::new(CoinGeckoConfig::default())),
        Arc::new(BinanceClient::new(BinanceConfig::default())),
    ]
}
