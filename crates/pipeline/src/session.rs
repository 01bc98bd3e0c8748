//! Per-asset prediction session orchestration.
//!
//! A [`PredictionSession`] owns the provider chain, the retry policy and
//! the prediction log. Each [`run`](PredictionSession::run) spawns a task
//! that fetches (or synthesizes) a series, analyzes it, and later
//! resolves the prediction into a persisted record. Starting a new run
//! for the same asset supersedes the previous one: its task is stopped
//! and its pending record is never committed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use trendcast_core::{
    AssetQuery, Outcome, PersistentStore, PredictionRecord, PredictionResult, PriceSeries,
    SessionConfig, SourceClient, Timeframe,
};

use crate::fallback::FallbackCoordinator;
use crate::retry::RetryScheduler;
use crate::store::PredictionLog;
use crate::synthetic;

/// Shortest delay before a prediction resolves.
const MIN_RESOLUTION_SECS: f64 = 5.0;
/// Spread added on top of the minimum delay.
const RESOLUTION_SPREAD_SECS: f64 = 10.0;
/// Smallest simulated resolution move, in percent.
const MIN_MOVE_PERCENT: f64 = 0.5;
/// Spread added on top of the minimum move.
const MOVE_SPREAD_PERCENT: f64 = 5.0;

/// Events a run delivers to its subscriber, in order. The channel closes
/// after [`SessionEvent::RecordResolved`], or earlier when the run is
/// superseded.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A series is ready to display, together with its analysis.
    /// `degraded` is true when every provider was exhausted and the
    /// series is synthetic.
    SeriesReady {
        series: PriceSeries,
        prediction: PredictionResult,
        degraded: bool,
    },
    /// The prediction resolved and was appended to the log.
    RecordResolved(PredictionRecord),
}

struct InFlight {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl InFlight {
    fn cancel(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
    }
}

/// Orchestrates prediction runs against a fixed provider chain.
pub struct PredictionSession {
    clients: Vec<Arc<dyn SourceClient>>,
    config: SessionConfig,
    log: PredictionLog,
    seed: Option<u64>,
    runs_started: u64,
    in_flight: HashMap<String, InFlight>,
}

impl PredictionSession {
    #[must_use]
    pub fn new(
        clients: Vec<Arc<dyn SourceClient>>,
        config: SessionConfig,
        store: Arc<dyn PersistentStore>,
    ) -> Self {
        Self {
            clients,
            config,
            log: PredictionLog::new(store),
            seed: None,
            runs_started: 0,
            in_flight: HashMap::new(),
        }
    }

    /// Builds a session over the standard provider chain.
    #[must_use]
    pub fn with_default_sources(config: SessionConfig, store: Arc<dyn PersistentStore>) -> Self {
        Self::new(trendcast_sources::default_chain(), config, store)
    }

    /// Seeds the per-run rng for reproducible synthetic data, analysis
    /// jitter and resolution outcomes.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The log this session appends resolved records to.
    #[must_use]
    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    /// Number of runs currently tracked as in flight.
    #[must_use]
    pub fn in_flight_runs(&self) -> usize {
        self.in_flight.len()
    }

    /// Starts a run for `query` on `timeframe`, superseding any run still
    /// in flight for the same asset. Events arrive on the returned
    /// receiver; dropping it stops the run at the next send.
    pub fn run(
        &mut self,
        query: AssetQuery,
        timeframe: Timeframe,
    ) -> mpsc::Receiver<SessionEvent> {
        // Runs that resolved on their own leave a finished handle behind;
        // drop those before tracking the new one.
        self.in_flight.retain(|_, run| !run.handle.is_finished());

        let asset = query.provider_id();
        if let Some(previous) = self.in_flight.remove(&asset) {
            tracing::debug!(%asset, "superseding in-flight run");
            previous.cancel();
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.runs_started)),
            None => StdRng::from_entropy(),
        };
        self.runs_started += 1;

        let (event_tx, event_rx) = mpsc::channel(8);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let clients = self.clients.clone();
        let config = self.config.clone();
        let log = self.log.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = drive(clients, config, log, query, timeframe, rng, event_tx) => {}
                _ = shutdown_rx.changed() => {
                    tracing::debug!("run cancelled");
                }
            }
        });

        self.in_flight.insert(
            asset,
            InFlight {
                shutdown_tx,
                handle,
            },
        );
        event_rx
    }

    /// Cancels every in-flight run.
    pub fn shutdown(&mut self) {
        for (asset, in_flight) in self.in_flight.drain() {
            tracing::debug!(%asset, "cancelling run on shutdown");
            in_flight.cancel();
        }
    }
}

impl Drop for PredictionSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn drive(
    clients: Vec<Arc<dyn SourceClient>>,
    config: SessionConfig,
    log: PredictionLog,
    query: AssetQuery,
    timeframe: Timeframe,
    mut rng: StdRng,
    event_tx: mpsc::Sender<SessionEvent>,
) {
    let scheduler = RetryScheduler::new(
        FallbackCoordinator::new(clients, config.fetch_deadline()),
        config,
    );

    let (series, degraded) = match scheduler.fetch(&query, timeframe).await {
        Ok(series) => (series, false),
        Err(err) => {
            tracing::warn!(%err, asset = %query.provider_id(), "degrading to synthetic series");
            let now_ms = Utc::now().timestamp_millis();
            (synthetic::generate(&query, timeframe, now_ms, &mut rng), true)
        }
    };

    let prediction = trendcast_analytics::analyze(&series, &mut rng);
    if event_tx
        .send(SessionEvent::SeriesReady {
            series,
            prediction,
            degraded,
        })
        .await
        .is_err()
    {
        return;
    }

    // Plan the simulated resolution up front, then wait it out. A
    // superseded run never reaches the commit below.
    let delay =
        Duration::from_secs_f64(MIN_RESOLUTION_SECS + rng.gen::<f64>() * RESOLUTION_SPREAD_SECS);
    let profitable = rng.gen_bool(0.5);
    let magnitude = MIN_MOVE_PERCENT + rng.gen::<f64>() * MOVE_SPREAD_PERCENT;
    let percentage_change = if profitable { magnitude } else { -magnitude };

    tokio::time::sleep(delay).await;

    let record = PredictionRecord {
        asset_id: query.provider_id(),
        asset_symbol: query.provider_symbol(),
        timeframe,
        timestamp_ms: Utc::now().timestamp_millis(),
        initial_price: query.current_price,
        final_price: query.current_price * (1.0 + percentage_change / 100.0),
        percentage_change,
        outcome: if profitable {
            Outcome::Profit
        } else {
            Outcome::Loss
        },
    };
    log.append(&record);
    tracing::info!(
        asset = %record.asset_id,
        outcome = ?record.outcome,
        change = record.percentage_change,
        "prediction resolved"
    );
    let _ = event_tx.send(SessionEvent::RecordResolved(record)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testutil::{adequate_series, query, CallLog, StubClient};
    use trendcast_core::{ProviderKind, SourceError};

    fn session(clients: Vec<Arc<dyn SourceClient>>) -> PredictionSession {
        PredictionSession::new(clients, SessionConfig::default(), Arc::new(MemoryStore::new()))
            .with_seed(42)
    }

    async fn drain(mut rx: mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_run_emits_series_then_record() {
        let log = CallLog::default();
        let clients: Vec<Arc<dyn SourceClient>> = vec![StubClient::scripted(
            ProviderKind::CoinCap,
            &log,
            vec![Ok(adequate_series())],
        )];
        let mut session = session(clients);

        let events = drain(session.run(query(), Timeframe::H1)).await;
        assert_eq!(events.len(), 2);

        let SessionEvent::SeriesReady {
            series,
            prediction,
            degraded,
        } = &events[0]
        else {
            panic!("expected series first");
        };
        assert!(!degraded);
        assert!(series.is_adequate());
        assert!(prediction.is_well_formed());

        let SessionEvent::RecordResolved(record) = &events[1] else {
            panic!("expected record second");
        };
        assert_eq!(record.asset_id, "bitcoin");
        assert_eq!(record.initial_price, query().current_price);
        let magnitude = record.percentage_change.abs();
        assert!((0.5..=5.5).contains(&magnitude), "move {magnitude}");
        match record.outcome {
            Outcome::Profit => assert!(record.final_price > record.initial_price),
            Outcome::Loss => assert!(record.final_price < record.initial_price),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_chain_degrades_to_synthetic() {
        let log = CallLog::default();
        // Three attempts against one always-failing provider.
        let clients: Vec<Arc<dyn SourceClient>> = vec![StubClient::scripted(
            ProviderKind::CoinCap,
            &log,
            vec![
                Err(SourceError::HttpError(500)),
                Err(SourceError::HttpError(500)),
                Err(SourceError::HttpError(500)),
            ],
        )];
        let mut session = session(clients);

        let q = query();
        let events = drain(session.run(q.clone(), Timeframe::H1)).await;
        let SessionEvent::SeriesReady {
            series, degraded, ..
        } = &events[0]
        else {
            panic!("expected series first");
        };
        assert!(degraded);
        assert_eq!(series.len(), Timeframe::H1.synthetic_points());
        assert_eq!(series.last().unwrap().price, q.current_price);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_record_lands_in_log() {
        let log = CallLog::default();
        let clients: Vec<Arc<dyn SourceClient>> = vec![StubClient::scripted(
            ProviderKind::CoinCap,
            &log,
            vec![Ok(adequate_series())],
        )];
        let mut session = session(clients);

        let events = drain(session.run(query(), Timeframe::D1)).await;
        let SessionEvent::RecordResolved(record) = events.last().unwrap() else {
            panic!("expected record last");
        };

        let stored = session.log().for_asset("bitcoin", "btc");
        assert_eq!(stored, vec![record.clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_run_never_commits_record() {
        let log = CallLog::default();
        let clients: Vec<Arc<dyn SourceClient>> = vec![StubClient::scripted(
            ProviderKind::CoinCap,
            &log,
            vec![Ok(adequate_series()), Ok(adequate_series())],
        )];
        let mut session = session(clients);

        let first_rx = session.run(query(), Timeframe::M30);
        let second_rx = session.run(query(), Timeframe::H1);

        let first_events = drain(first_rx).await;
        assert!(
            !first_events
                .iter()
                .any(|e| matches!(e, SessionEvent::RecordResolved(_))),
            "superseded run committed a record"
        );

        let second_events = drain(second_rx).await;
        assert!(matches!(
            second_events.last(),
            Some(SessionEvent::RecordResolved(_))
        ));
        // Only the surviving run reached the log.
        assert_eq!(session.log().all().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_for_different_assets_coexist() {
        let log = CallLog::default();
        let clients: Vec<Arc<dyn SourceClient>> = vec![StubClient::scripted(
            ProviderKind::CoinCap,
            &log,
            vec![Ok(adequate_series()), Ok(adequate_series())],
        )];
        let mut session = session(clients);

        let mut other = query();
        other.id = "ethereum".to_string();
        other.symbol = "eth".to_string();

        let btc_rx = session.run(query(), Timeframe::H1);
        let eth_rx = session.run(other, Timeframe::H1);

        let btc_events = drain(btc_rx).await;
        let eth_events = drain(eth_rx).await;
        assert!(matches!(btc_events.last(), Some(SessionEvent::RecordResolved(_))));
        assert!(matches!(eth_events.last(), Some(SessionEvent::RecordResolved(_))));
        assert_eq!(session.log().all().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_runs_are_pruned_on_next_run() {
        let log = CallLog::default();
        let clients: Vec<Arc<dyn SourceClient>> = vec![StubClient::scripted(
            ProviderKind::CoinCap,
            &log,
            vec![Ok(adequate_series()), Ok(adequate_series())],
        )];
        let mut session = session(clients);

        let events = drain(session.run(query(), Timeframe::H1)).await;
        assert!(matches!(events.last(), Some(SessionEvent::RecordResolved(_))));

        // The resolved run's handle must not linger once another asset
        // starts.
        let mut other = query();
        other.id = "ethereum".to_string();
        other.symbol = "eth".to_string();
        let rx = session.run(other, Timeframe::H1);
        assert_eq!(session.in_flight_runs(), 1);
        drain(rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_runs() {
        let log = CallLog::default();
        let clients: Vec<Arc<dyn SourceClient>> = vec![StubClient::scripted(
            ProviderKind::CoinCap,
            &log,
            vec![Ok(adequate_series())],
        )];
        let mut session = session(clients);

        let rx = session.run(query(), Timeframe::H1);
        session.shutdown();

        let events = drain(rx).await;
        assert!(!events
            .iter()
            .any(|e| matches!(e, SessionEvent::RecordResolved(_))));
        assert!(session.log().all().is_empty());
    }
}
