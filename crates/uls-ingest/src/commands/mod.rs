//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Commands print
//! user-facing output to stdout; diagnostics go through `tracing`.

pub mod init;
pub mod run;
pub mod stats;

use crate::config::{parse_delimiter, IngestConfig};
use crate::error::Result;
use crate::{Cli, Commands};

/// Build the effective config: environment first, then command-line flags.
pub fn resolve_config(cli: &Cli) -> Result<IngestConfig> {
    let mut config = IngestConfig::from_env()?;

    if let Some(database) = &cli.database {
        config.database_path = database.clone();
    }

    match &cli.command {
        Commands::Run {
            batch_size,
            delimiter,
            ..
        } => {
            if let Some(size) = batch_size {
                config.batch_size = *size;
            }
            if let Some(delimiter) = delimiter {
                config.delimiter = parse_delimiter(delimiter)?;
            }
        },
        Commands::Stats {
            limit: Some(limit), ..
        } => config.audit_limit = *limit,
        _ => {},
    }

    config.validate()?;
    Ok(config)
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
