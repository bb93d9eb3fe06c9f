//! `uls-ingest stats` command implementation
//!
//! Shows per-table row counts and the most recent audit entries.

use super::format_bytes;
use crate::config::IngestConfig;
use crate::error::Result;
use crate::reporter::Stats;
use crate::store::Store;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use uls_common::UlsError;

/// Print store statistics as tables or JSON.
pub fn run(config: &IngestConfig, json: bool) -> Result<()> {
    if !config.database_path.exists() {
        println!(
            "{} No database at {}. Run 'uls-ingest init' first.",
            "→".cyan(),
            config.database_path.display()
        );
        return Ok(());
    }

    let store = Store::open(&config.database_path)?;
    let stats = Stats::collect(&store, config.audit_limit)?;

    if json {
        let rendered = serde_json::to_string_pretty(&stats).map_err(UlsError::from)?;
        println!("{rendered}");
    } else {
        print_tables(&stats);
    }

    Ok(())
}

fn print_tables(stats: &Stats) {
    let mut counts = Table::new();
    counts
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Table", "Rows"]);
    for count in &stats.tables {
        counts.add_row(vec![count.table.to_string(), count.rows.to_string()]);
    }

    println!("{}", "Tables:".cyan().bold());
    println!("{counts}");
    println!("  Total rows: {}", stats.total_rows());
    println!();

    if stats.recent_audits.is_empty() {
        println!("No files ingested yet.");
        return;
    }

    let mut audits = Table::new();
    audits
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Ingested", "File", "Type", "Size", "Processed", "Skipped", "Status"]);
    for entry in &stats.recent_audits {
        let status = if entry.success {
            "ok".to_string()
        } else {
            format!("failed: {}", entry.error_message.as_deref().unwrap_or_default())
        };
        audits.add_row(vec![
            entry.ingested_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.file_name.clone(),
            entry.file_type.clone(),
            format_bytes(entry.file_size),
            entry.records_processed.to_string(),
            entry.records_skipped.to_string(),
            status,
        ]);
    }

    println!("{}", "Recent files:".cyan().bold());
    println!("{audits}");
}
