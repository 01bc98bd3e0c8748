pub mod config;
pub mod error;
pub mod prediction;
pub mod traits;
pub mod types;

pub use config::SessionConfig;
pub use error::{FetchOutcome, ProviderKind, SourceError};
pub use prediction::{Outcome, PredictionRecord, PredictionResult, Trend, ViewState};
pub use traits::{PersistentStore, SourceClient};
pub use types::{AssetQuery, PricePoint, PriceSeries, Timeframe, MIN_ADEQUATE_POINTS};
