use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 上游回傳的原始記錄，欄位名稱不保證穩定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }

    pub fn from_json_object(obj: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: obj.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

/// 位置分類。無法辨識的字串一律視為 Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Gkp,
    Def,
    Mid,
    Fwd,
    Unknown,
}

impl Category {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "GKP" | "GK" => Category::Gkp,
            "DEF" => Category::Def,
            "MID" => Category::Mid,
            "FWD" => Category::Fwd,
            _ => Category::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Category::Gkp => "GKP",
            Category::Def => "DEF",
            Category::Mid => "MID",
            Category::Fwd => "FWD",
            Category::Unknown => "?",
        }
    }
}

/// Record 經過別名解析後的固定欄位視圖
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub player_id: Option<i64>,
    pub display_name: String,
    /// 原樣保留上游字串，分類請用 `category_kind()`
    pub category: String,
    pub group_id: Option<i64>,
    pub group_label: String,
    pub status: String,
    /// 原生單位（顯示單位 × ratio）
    pub native_cost: Option<i64>,
    pub score: Option<f64>,
    pub derived_value: Option<f64>,
}

impl NormalizedRow {
    pub fn category_kind(&self) -> Category {
        Category::from_code(&self.category)
    }

    pub fn sort_value(&self, key: SortKey) -> Option<f64> {
        match key {
            SortKey::Score => self.score,
            SortKey::DerivedValue => self.derived_value,
            SortKey::NativeCost => self.native_cost.map(|c| c as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Score,
    DerivedValue,
    NativeCost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// 篩選條件快照。draft 與 applied 都是這個型別
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryState {
    pub period_id: u32,
    pub category: Option<String>,
    pub status: Option<String>,
    /// 只接受整數 id，不接受隊名字串
    pub group_id: Option<i64>,
    /// 顯示單位
    pub cost_ceiling: Option<f64>,
    pub score_floor: Option<f64>,
    pub model_name: Option<String>,
    /// 顯示視窗大小，與上游分頁無關
    pub page_size: usize,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            period_id: 1,
            category: None,
            status: None,
            group_id: None,
            cost_ceiling: None,
            score_floor: None,
            model_name: None,
            page_size: 50,
            sort_key: SortKey::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

/// 送往上游的單頁查詢
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamQuery {
    pub period_id: u32,
    pub limit: usize,
    pub offset: usize,
    pub order_by: String,
    pub category: Option<String>,
    pub status: Option<String>,
    pub group_id: Option<i64>,
    pub max_cost_native: Option<i64>,
    pub score_floor: Option<f64>,
    pub model_name: Option<String>,
}

impl UpstreamQuery {
    pub fn at_offset(&self, offset: usize) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
}

/// 上游回傳的一頁資料
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    pub records: Vec<Record>,
    pub total: Option<usize>,
}

/// 一次 apply 所取得的完整資料集，依抵達順序保存
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedDataset {
    pub generation: u64,
    pub rows: Vec<NormalizedRow>,
    pub total_count: usize,
    pub truncated: bool,
    pub fetched_at: DateTime<Utc>,
}

impl AggregatedDataset {
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            rows: Vec::new(),
            total_count: 0,
            truncated: false,
            fetched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// 每次向上游要的筆數，不可超過上游上限
    pub chunk_size: usize,
    /// offset 超過此值即停止並標記 truncated
    pub max_offset: usize,
    pub cost_unit_ratio: i64,
    pub warn_on_truncation: bool,
}

pub const SOURCE_PAGE_CEILING: usize = 200;
pub const DEFAULT_COST_UNIT_RATIO: i64 = 10;

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            chunk_size: SOURCE_PAGE_CEILING,
            max_offset: 5_000,
            cost_unit_ratio: DEFAULT_COST_UNIT_RATIO,
            warn_on_truncation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(Category::from_code("MID"), Category::Mid);
        assert_eq!(Category::from_code("gkp"), Category::Gkp);
        assert_eq!(Category::from_code("Striker"), Category::Unknown);
        assert_eq!(Category::from_code(""), Category::Unknown);
    }

    #[test]
    fn test_unknown_category_is_kept_verbatim() {
        let row = NormalizedRow {
            category: "Striker".to_string(),
            ..Default::default()
        };
        assert_eq!(row.category, "Striker");
        assert_eq!(row.category_kind(), Category::Unknown);
    }

    #[test]
    fn test_sort_value_by_key() {
        let row = NormalizedRow {
            native_cost: Some(80),
            score: Some(6.0),
            derived_value: Some(0.75),
            ..Default::default()
        };
        assert_eq!(row.sort_value(SortKey::Score), Some(6.0));
        assert_eq!(row.sort_value(SortKey::DerivedValue), Some(0.75));
        assert_eq!(row.sort_value(SortKey::NativeCost), Some(80.0));
    }

    #[test]
    fn test_query_state_deserializes_with_defaults() {
        let state: QueryState =
            serde_json::from_str(r#"{"period_id": 12, "sort_key": "derived_value"}"#).unwrap();
        assert_eq!(state.period_id, 12);
        assert_eq!(state.sort_key, SortKey::DerivedValue);
        assert_eq!(state.sort_direction, SortDirection::Descending);
        assert_eq!(state.page_size, 50);
    }
}
