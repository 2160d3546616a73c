use clap::Parser;
use predictions_explorer::adapters::csv_export;
use predictions_explorer::core::units::UnitConverter;
use predictions_explorer::domain::model::{Category, NormalizedRow};
use predictions_explorer::utils::error::{ErrorSeverity, ExplorerError};
use predictions_explorer::utils::{logger, validation::Validate};
use predictions_explorer::{Aggregator, ApplyOutcome, CliConfig, HttpPredictionSource, Page};

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

/// 可辨識的位置用標準代碼，其餘原樣顯示
fn category_label(row: &NormalizedRow) -> &str {
    match row.category_kind() {
        Category::Unknown => &row.category,
        kind => kind.code(),
    }
}

fn print_page(page: &Page, converter: &UnitConverter) {
    println!(
        "{:>4}  {:<20} {:<4} {:<5} {:>6} {:>7} {:>6}",
        "#", "Name", "Pos", "Team", "Cost", "Points", "Value"
    );
    for (i, row) in page.rows.iter().enumerate() {
        let cost = row.native_cost.map(|c| converter.to_display(c as f64));
        println!(
            "{:>4}  {:<20} {:<4} {:<5} {:>6} {:>7} {:>6}",
            page.window_start + i + 1,
            row.display_name,
            category_label(row),
            row.group_label,
            fmt_opt(cost, 1),
            fmt_opt(row.score, 2),
            fmt_opt(row.derived_value, 2),
        );
    }

    let total_label = if page.truncated {
        format!("at least {}", page.total)
    } else {
        page.total.to_string()
    };
    println!(
        "Showing {}-{} of {}",
        if page.rows.is_empty() { 0 } else { page.window_start + 1 },
        page.window_end,
        total_label
    );
}

fn exit_code(e: &ExplorerError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting predictions-explorer");
    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }

    let source = HttpPredictionSource::from_config(&config);
    let aggregator = Aggregator::with_initial_state(source, config.aggregation, config.query.clone());
    let converter = UnitConverter::new(aggregator.settings().cost_unit_ratio);

    match aggregator.apply_draft().await {
        ApplyOutcome::Committed {
            rows,
            total,
            truncated,
            ..
        } => {
            tracing::info!("✅ Aggregated {} rows (total {})", rows, total);
            if truncated && aggregator.settings().warn_on_truncation {
                eprintln!(
                    "⚠️ Dataset was truncated at the safety bound; the total shown is a lower bound"
                );
            }
        }
        ApplyOutcome::Failed {
            message, status, ..
        } => {
            tracing::error!("❌ Fetch failed (status {:?}): {}", status, message);
            eprintln!("❌ {}", message);
            eprintln!("💡 Suggestion: Check the upstream service and run the command again");
            std::process::exit(2);
        }
        ApplyOutcome::Superseded { generation } => {
            tracing::warn!("⚠️ Result of generation {} was superseded", generation);
        }
    }

    aggregator.go_to_offset(cli.offset);
    print_page(&aggregator.current_page(), &converter);

    if let Some(path) = &cli.export {
        if let Err(e) = predictions_explorer::utils::validation::validate_path("export", path)
            .and_then(|_| csv_export::export_to_file(path, &aggregator.sorted_rows(), &converter))
        {
            tracing::error!("❌ Export failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
        println!("📁 Exported sorted dataset to: {}", path);
    }

    Ok(())
}
