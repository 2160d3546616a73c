#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::{AggregationSettings, QueryState, SOURCE_PAGE_CEILING};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use std::collections::HashMap;

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8000/predictions";
pub const ENDPOINT_ENV_VAR: &str = "PREDICTIONS_API_ENDPOINT";

/// 合併檔案設定與命令列覆蓋後的最終設定
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerConfig {
    pub api_endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub headers: HashMap<String, String>,
    pub aggregation: AggregationSettings,
    pub query: QueryState,
    pub json_logs: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_endpoint: std::env::var(ENDPOINT_ENV_VAR)
                .unwrap_or_else(|_| DEFAULT_API_ENDPOINT.to_string()),
            timeout_seconds: Some(30),
            headers: HashMap::new(),
            aggregation: AggregationSettings::default(),
            query: QueryState::default(),
            json_logs: false,
        }
    }
}

impl ConfigProvider for ExplorerConfig {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }
}

impl Validate for ExplorerConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source.endpoint", &self.api_endpoint)?;
        validate_range(
            "aggregation.chunk_size",
            self.aggregation.chunk_size,
            1,
            SOURCE_PAGE_CEILING,
        )?;
        validate_positive_number(
            "aggregation.cost_unit_ratio",
            self.aggregation.cost_unit_ratio.max(0) as usize,
            1,
        )?;
        validate_positive_number("query.period_id", self.query.period_id as usize, 1)?;
        validate_positive_number("query.page_size", self.query.page_size, 1)?;
        Ok(())
    }
}
