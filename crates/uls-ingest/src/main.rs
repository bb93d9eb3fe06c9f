//! ULS ingest CLI - Main entry point

use anyhow::Context;
use clap::Parser;
use std::process;
use tracing::error;
use uls_common::logging::{init_logging, LogConfig, LogLevel};
use uls_common::UlsError;
use uls_ingest::{commands, Cli, Commands, IngestError};

/// Exit code for configuration and usage errors.
const EXIT_USAGE: i32 = 2;

fn main() {
    let cli = Cli::parse();

    // Environment sets the baseline, -v lowers the threshold from there
    let mut log_config = LogConfig::from_env().unwrap_or_default();
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    match execute_command(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);

            let usage = matches!(
                e.downcast_ref::<IngestError>(),
                Some(IngestError::Config(_) | IngestError::Common(UlsError::UnclassifiedFile(_)))
            );
            process::exit(if usage { EXIT_USAGE } else { 1 });
        },
    }
}

/// Execute the CLI command, returning the process exit code
fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    let config = commands::resolve_config(cli).context("Invalid configuration")?;

    match &cli.command {
        Commands::Init => {
            commands::init::run(&config).with_context(|| {
                format!("Failed to initialise {}", config.database_path.display())
            })?;
            Ok(0)
        },

        Commands::Run {
            paths, record_type, ..
        } => {
            let summary = commands::run::run(&config, paths, *record_type)
                .context("Ingestion run failed")?;
            Ok(summary.exit_status().code())
        },

        Commands::Stats { json, .. } => {
            commands::stats::run(&config, *json).with_context(|| {
                format!("Failed to read stats from {}", config.database_path.display())
            })?;
            Ok(0)
        },
    }
}
