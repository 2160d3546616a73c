use crate::core::metrics::derived_value;
use crate::core::units::UnitConverter;
use crate::domain::model::{NormalizedRow, Record};
use serde_json::Value;

/// 每個語意欄位的候選欄位名稱，依優先順序排列。
/// 新增別名只需在對應陣列加一項。
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub player_id: &'static [&'static str],
    pub display_name: &'static [&'static str],
    pub category: &'static [&'static str],
    pub group_id: &'static [&'static str],
    pub group_label: &'static [&'static str],
    pub status: &'static [&'static str],
    pub native_cost: &'static [&'static str],
    /// 以顯示單位表示的成本，會經由 UnitConverter 轉成原生單位
    pub display_cost: &'static [&'static str],
    pub score: &'static [&'static str],
}

pub const DEFAULT_ALIASES: AliasTable = AliasTable {
    player_id: &["player_id", "id"],
    display_name: &["name", "player_name", "web_name"],
    category: &["position", "pos", "position_name"],
    group_id: &["team_id"],
    group_label: &["team", "team_short_name", "team_name"],
    status: &["status"],
    native_cost: &["now_cost", "cost"],
    display_cost: &["cost_m", "price"],
    score: &["predicted_points", "score", "points"],
};

impl Default for AliasTable {
    fn default() -> Self {
        DEFAULT_ALIASES
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RowNormalizer {
    aliases: AliasTable,
    converter: UnitConverter,
}

impl RowNormalizer {
    pub fn new(aliases: AliasTable, converter: UnitConverter) -> Self {
        Self { aliases, converter }
    }

    pub fn with_converter(converter: UnitConverter) -> Self {
        Self::new(DEFAULT_ALIASES, converter)
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// 解析一筆 Record。不會失敗，缺少或格式錯誤的欄位退化為 None / 空字串。
    /// 上游自帶的 `value` 欄位一律忽略，derived_value 永遠重新計算。
    pub fn normalize(&self, record: &Record) -> NormalizedRow {
        let a = &self.aliases;

        let native_cost = match resolve(record, a.native_cost) {
            Some(v) => as_native_int(v),
            None => resolve(record, a.display_cost)
                .and_then(as_f64)
                .map(|display| self.converter.to_native(display)),
        };
        let score = resolve(record, a.score).and_then(as_f64);
        let cost_display = native_cost.map(|c| self.converter.to_display(c as f64));

        NormalizedRow {
            player_id: resolve(record, a.player_id).and_then(as_native_int),
            display_name: resolve_string(record, a.display_name),
            category: resolve_string(record, a.category),
            group_id: resolve(record, a.group_id).and_then(as_native_int),
            group_label: resolve_string(record, a.group_label),
            status: resolve_string(record, a.status),
            native_cost,
            score,
            derived_value: derived_value(score, cost_display),
        }
    }

    pub fn normalize_all(&self, records: &[Record]) -> Vec<NormalizedRow> {
        records.iter().map(|r| self.normalize(r)).collect()
    }
}

/// 第一個存在且非 null 的別名勝出
fn resolve<'a>(record: &'a Record, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| record.get(alias))
        .find(|v| !v.is_null())
}

fn resolve_string(record: &Record, aliases: &[&str]) -> String {
    match resolve(record, aliases) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn as_native_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(obj) => Record::from_json_object(obj),
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn test_normalize_full_record() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({
            "player_id": 7,
            "web_name": "Saka",
            "position": "MID",
            "team_id": 1,
            "team_short_name": "ARS",
            "status": "a",
            "now_cost": 100,
            "predicted_points": 6.5
        })));

        assert_eq!(row.player_id, Some(7));
        assert_eq!(row.display_name, "Saka");
        assert_eq!(row.category, "MID");
        assert_eq!(row.group_id, Some(1));
        assert_eq!(row.group_label, "ARS");
        assert_eq!(row.status, "a");
        assert_eq!(row.native_cost, Some(100));
        assert_eq!(row.score, Some(6.5));
        assert_eq!(row.derived_value, Some(0.65));
    }

    #[test]
    fn test_secondary_alias_matches_primary_alias() {
        let normalizer = RowNormalizer::default();
        let primary = normalizer.normalize(&record(json!({
            "name": "Haaland", "position": "FWD", "team": "MCI", "now_cost": 150, "predicted_points": 9.0
        })));
        let secondary = normalizer.normalize(&record(json!({
            "player_name": "Haaland", "pos": "FWD", "team_short_name": "MCI", "cost": 150, "score": 9.0
        })));

        assert_eq!(primary, secondary);
    }

    #[test]
    fn test_null_alias_falls_through_to_next() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({
            "name": null,
            "player_name": null,
            "web_name": "Palmer"
        })));
        assert_eq!(row.display_name, "Palmer");
    }

    #[test]
    fn test_missing_fields_degrade_without_error() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({"unrelated": true})));

        assert_eq!(row, NormalizedRow::default());
    }

    #[test]
    fn test_malformed_numbers_degrade_to_none() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({
            "now_cost": "not-a-number",
            "predicted_points": {"nested": 1}
        })));
        assert_eq!(row.native_cost, None);
        assert_eq!(row.score, None);
        assert_eq!(row.derived_value, None);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({
            "now_cost": "80",
            "predicted_points": " 6.0 "
        })));
        assert_eq!(row.native_cost, Some(80));
        assert_eq!(row.derived_value, Some(0.75));
    }

    #[test]
    fn test_source_value_field_is_ignored() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({
            "now_cost": 80,
            "predicted_points": 6.0,
            "value": 99.0
        })));
        assert_eq!(row.derived_value, Some(0.75));

        let free = normalizer.normalize(&record(json!({
            "now_cost": 0,
            "predicted_points": 6.0,
            "value": 60.0
        })));
        assert_eq!(free.derived_value, None);
    }

    #[test]
    fn test_display_cost_alias_is_converted_to_native() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({
            "name": "Isak",
            "cost_m": 8.5,
            "predicted_points": 5.1,
            "value": 0.6
        })));
        assert_eq!(row.native_cost, Some(85));
        assert_eq!(row.derived_value, Some(5.1 / 8.5));
    }

    #[test]
    fn test_unknown_category_passes_through() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({"position": "Coach"})));
        assert_eq!(row.category, "Coach");
        assert_eq!(
            row.category_kind(),
            crate::domain::model::Category::Unknown
        );
    }

    #[test]
    fn test_group_id_only_accepts_integers() {
        let normalizer = RowNormalizer::default();
        let row = normalizer.normalize(&record(json!({"team_id": "Arsenal", "team": "ARS"})));
        assert_eq!(row.group_id, None);
        assert_eq!(row.group_label, "ARS");
    }
}
