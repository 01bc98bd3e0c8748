//! Shared stubs for the pipeline unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use trendcast_core::{
    AssetQuery, PricePoint, PriceSeries, ProviderKind, SourceClient, SourceError, Timeframe,
};

/// Records the order providers were called in, across a set of stubs.
#[derive(Default, Clone)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<ProviderKind>>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<ProviderKind> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: ProviderKind) {
        self.calls.lock().unwrap().push(kind);
    }
}

/// A provider that replays a script of responses. Once the script runs
/// out, further calls time out.
pub struct StubClient {
    kind: ProviderKind,
    log: CallLog,
    script: Mutex<VecDeque<Result<PriceSeries, SourceError>>>,
}

impl StubClient {
    pub fn scripted(
        kind: ProviderKind,
        log: &CallLog,
        script: Vec<Result<PriceSeries, SourceError>>,
    ) -> Arc<dyn SourceClient> {
        Arc::new(Self {
            kind,
            log: log.clone(),
            script: Mutex::new(script.into()),
        })
    }
}

#[async_trait]
impl SourceClient for StubClient {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(
        &self,
        _query: &AssetQuery,
        _timeframe: Timeframe,
        _deadline: Duration,
    ) -> Result<PriceSeries, SourceError> {
        self.log.record(self.kind);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SourceError::Timeout))
    }
}

/// A 20-point series comfortably above the adequacy threshold.
pub fn adequate_series() -> PriceSeries {
    (0..20)
        .map(|i| PricePoint::new(i64::from(i) * 60_000, 100.0 + f64::from(i)))
        .collect::<Vec<_>>()
        .into()
}

pub fn query() -> AssetQuery {
    AssetQuery {
        id: "bitcoin".to_string(),
        symbol: "btc".to_string(),
        current_price: 50000.0,
        change_24h_percent: 2.5,
        market_cap: 1_000_000_000_000.0,
        total_volume: 30_000_000_000.0,
        ath_price: Some(69000.0),
        atl_price: Some(67.81),
    }
}
