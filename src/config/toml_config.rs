use crate::config::ExplorerConfig;
use crate::domain::model::{AggregationSettings, QueryState};
use crate::utils::error::{ExplorerError, Result};
use crate::utils::validation::validate_required_field;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub aggregation: AggregationSettings,
    #[serde(default)]
    pub query: QueryState,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 可由命令列 `--api-endpoint` 補上
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ExplorerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_TOKEN})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ExplorerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn into_explorer_config(self) -> Result<ExplorerConfig> {
        let api_endpoint = validate_required_field("source.endpoint", &self.source.endpoint)?.clone();
        let defaults = ExplorerConfig::default();
        Ok(ExplorerConfig {
            api_endpoint,
            timeout_seconds: self.source.timeout_seconds.or(defaults.timeout_seconds),
            headers: self.source.headers.unwrap_or_default(),
            aggregation: self.aggregation,
            query: self.query,
            json_logs: self.logging.and_then(|l| l.json).unwrap_or(false),
        })
    }
}
