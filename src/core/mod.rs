pub mod aggregator;
pub mod fetch_loop;
pub mod metrics;
pub mod normalizer;
pub mod query_state;
pub mod sort;
pub mod units;
pub mod window;

pub use crate::domain::model::{NormalizedRow, QueryState, Record};
pub use crate::domain::ports::{ConfigProvider, PredictionSource};
pub use crate::utils::error::Result;
