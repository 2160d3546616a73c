pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::http_source::HttpPredictionSource;
pub use config::ExplorerConfig;
pub use core::aggregator::{Aggregator, ApplyOutcome, Page, SessionStatus};
pub use domain::model::{AggregatedDataset, AggregationSettings, NormalizedRow, QueryState};
pub use utils::error::{ExplorerError, Result};
