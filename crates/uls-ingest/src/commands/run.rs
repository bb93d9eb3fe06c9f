//! `uls-ingest run` command implementation
//!
//! Ingests source files and directories, then prints the run summary.

use super::format_bytes;
use crate::config::IngestConfig;
use crate::contract::ContractSet;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::reporter::{ExitStatus, RunSummary};
use crate::source::discover;
use crate::store::Store;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use std::path::PathBuf;
use tracing::warn;
use uls_common::RecordType;

/// Ingest `paths`, optionally forcing one record type for all of them.
pub fn run(config: &IngestConfig, paths: &[PathBuf], forced: Option<RecordType>) -> Result<RunSummary> {
    let sources = discover(paths, forced)?;
    if sources.is_empty() {
        warn!(paths = paths.len(), "No source files found");
    }

    let store = Store::open(&config.database_path)?;
    store.init_schema()?;

    let pipeline = Pipeline::new(store, ContractSet::standard(), config)?;
    let (summary, _store) = pipeline.run(&sources);

    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    let mut files = Table::new();
    files
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["File", "Type", "Size", "Parsed", "Skipped", "Status"]);

    for file in &summary.files {
        let status = match &file.error {
            None => "ok".to_string(),
            Some(err) => format!("failed: {err}"),
        };
        files.add_row(vec![
            file.path.display().to_string(),
            file.record_type.to_string(),
            format_bytes(file.size_bytes),
            file.parsed.to_string(),
            file.skipped.to_string(),
            status,
        ]);
    }

    let mut tables = Table::new();
    tables
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Table", "Inserted", "Skipped", "Dropped", "Flushes", "Halted"]);

    for table in &summary.tables.tables {
        tables.add_row(vec![
            table.table.to_string(),
            table.counters.inserted.to_string(),
            table.counters.skipped.to_string(),
            table.counters.dropped.to_string(),
            table.counters.flushes.to_string(),
            table.halted.clone().unwrap_or_default(),
        ]);
    }

    println!("{}", "Files:".cyan().bold());
    println!("{files}");
    println!("{}", "Tables:".cyan().bold());
    println!("{tables}");

    let status = summary.exit_status();
    let line = format!(
        "Run {}: {} file(s), {} row(s) inserted",
        summary.run_id,
        summary.files.len(),
        summary.tables.total_inserted()
    );
    match status {
        ExitStatus::Success => println!("{} {}", "✓".green(), line),
        ExitStatus::SuccessWithWarnings => println!("{} {} (with warnings)", "!".yellow(), line),
        ExitStatus::Failure => println!("{} {} (no file could be processed)", "✗".red(), line),
    }
}
