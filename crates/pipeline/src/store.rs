//! Prediction-log persistence over the injected key-value store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use trendcast_core::{PersistentStore, PredictionRecord};

/// Key under which resolved prediction records are stored, as a JSON
/// array.
pub const PREDICTION_LOG_KEY: &str = "predictionResults";

/// Append-only log of resolved predictions on top of a
/// [`PersistentStore`]. Records are immutable once written; corruption in
/// the stored JSON resets the log rather than failing the session.
#[derive(Clone)]
pub struct PredictionLog {
    store: Arc<dyn PersistentStore>,
}

impl PredictionLog {
    #[must_use]
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    /// All records in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<PredictionRecord> {
        let Some(raw) = self.store.get(PREDICTION_LOG_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(%err, "prediction log corrupted, starting fresh");
                Vec::new()
            }
        }
    }

    /// Records belonging to one asset, matched by id or symbol.
    #[must_use]
    pub fn for_asset(&self, id: &str, symbol: &str) -> Vec<PredictionRecord> {
        self.all()
            .into_iter()
            .filter(|r| r.matches_asset(id, symbol))
            .collect()
    }

    /// Appends one resolved record.
    pub fn append(&self, record: &PredictionRecord) {
        let mut records = self.all();
        records.push(record.clone());
        match serde_json::to_string(&records) {
            Ok(json) => self.store.set(PREDICTION_LOG_KEY, json),
            Err(err) => tracing::error!(%err, "failed to serialize prediction log"),
        }
    }
}

/// In-process [`PersistentStore`] for tests and headless use.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }
}
