//! Acquisition pipeline: fallback chain, retry schedule, synthetic
//! degradation and session orchestration.
//!
//! The [`FallbackCoordinator`] walks the provider chain in order; the
//! [`RetryScheduler`] re-runs the whole chain with exponential backoff;
//! when everything is exhausted, [`synthetic::generate`] fabricates a
//! plausible series so the session always has something to show. A
//! [`PredictionSession`] ties these together per asset and appends
//! resolved predictions to a [`PredictionLog`].

pub mod error;
pub mod fallback;
pub mod retry;
pub mod session;
pub mod store;
pub mod synthetic;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::ExhaustedError;
pub use fallback::FallbackCoordinator;
pub use retry::RetryScheduler;
pub use session::{PredictionSession, SessionEvent};
pub use store::{MemoryStore, PredictionLog, PREDICTION_LOG_KEY};
