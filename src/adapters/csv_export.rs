use crate::core::units::UnitConverter;
use crate::domain::model::NormalizedRow;
use crate::utils::error::Result;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 9] = [
    "rank",
    "player_id",
    "name",
    "position",
    "team",
    "status",
    "cost",
    "predicted_points",
    "value",
];

/// 把排序後的資料集寫成 CSV，rank 從 1 開始
pub fn write_rows<W: Write>(writer: W, rows: &[NormalizedRow], converter: &UnitConverter) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for (index, row) in rows.iter().enumerate() {
        csv_writer.write_record([
            (index + 1).to_string(),
            row.player_id.map(|id| id.to_string()).unwrap_or_default(),
            row.display_name.clone(),
            row.category.clone(),
            row.group_label.clone(),
            row.status.clone(),
            row.native_cost
                .map(|c| converter.to_display(c as f64).to_string())
                .unwrap_or_default(),
            row.score.map(|s| s.to_string()).unwrap_or_default(),
            row.derived_value.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_to_file<P: AsRef<Path>>(path: P, rows: &[NormalizedRow], converter: &UnitConverter) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(&path)?;
    write_rows(file, rows, converter)?;
    tracing::info!("📁 Exported {} rows to {}", rows.len(), path.as_ref().display());
    Ok(())
}
