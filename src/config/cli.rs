use crate::config::toml_config::TomlConfig;
use crate::config::ExplorerConfig;
use crate::domain::model::{SortDirection, SortKey};
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "predictions-explorer")]
#[command(about = "Fetch a filtered prediction set, rank it locally and page through it")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Predictions endpoint (overrides config file)")]
    pub api_endpoint: Option<String>,

    #[arg(long, alias = "gw", help = "Target gameweek")]
    pub period: Option<u32>,

    #[arg(long, help = "Position filter (GKP, DEF, MID, FWD)")]
    pub category: Option<String>,

    #[arg(long, help = "Availability status filter, e.g. a")]
    pub status: Option<String>,

    #[arg(long, help = "Team id filter")]
    pub team_id: Option<i64>,

    #[arg(long, help = "Maximum cost in display units, e.g. 7.5")]
    pub max_cost: Option<f64>,

    #[arg(long, help = "Minimum predicted points")]
    pub min_score: Option<f64>,

    #[arg(long)]
    pub model_name: Option<String>,

    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    #[arg(long, value_enum)]
    pub direction: Option<SortDirection>,

    #[arg(long, help = "Rows per displayed page")]
    pub page_size: Option<usize>,

    #[arg(long, default_value = "0", help = "Offset of the displayed window")]
    pub offset: usize,

    #[arg(long, help = "Rows requested per upstream call")]
    pub chunk_size: Option<usize>,

    #[arg(long, help = "Stop paging once the upstream offset exceeds this value")]
    pub max_offset: Option<usize>,

    #[arg(long, help = "Write the full sorted dataset to this CSV file")]
    pub export: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 載入設定檔（若有）並套用命令列覆蓋
    pub fn resolve(&self) -> Result<ExplorerConfig> {
        let base = match &self.config {
            Some(path) => {
                let mut file = TomlConfig::from_file(path)?;
                if self.api_endpoint.is_some() {
                    file.source.endpoint = self.api_endpoint.clone();
                }
                file.into_explorer_config()?
            }
            None => ExplorerConfig::default(),
        };
        Ok(self.apply_overrides(base))
    }

    pub fn apply_overrides(&self, mut config: ExplorerConfig) -> ExplorerConfig {
        if let Some(endpoint) = &self.api_endpoint {
            config.api_endpoint = endpoint.clone();
        }

        let query = &mut config.query;
        if let Some(period) = self.period {
            query.period_id = period;
        }
        if self.category.is_some() {
            query.category = self.category.clone();
        }
        if self.status.is_some() {
            query.status = self.status.clone();
        }
        if self.team_id.is_some() {
            query.group_id = self.team_id;
        }
        if self.max_cost.is_some() {
            query.cost_ceiling = self.max_cost;
        }
        if self.min_score.is_some() {
            query.score_floor = self.min_score;
        }
        if self.model_name.is_some() {
            query.model_name = self.model_name.clone();
        }
        if let Some(sort) = self.sort {
            query.sort_key = sort;
        }
        if let Some(direction) = self.direction {
            query.sort_direction = direction;
        }
        if let Some(page_size) = self.page_size {
            query.page_size = page_size;
        }

        if let Some(chunk_size) = self.chunk_size {
            config.aggregation.chunk_size = chunk_size;
        }
        if let Some(max_offset) = self.max_offset {
            config.aggregation.max_offset = max_offset;
        }

        config.json_logs |= self.log_json;
        config
    }
}
