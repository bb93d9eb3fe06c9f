//! `uls-ingest init` command implementation
//!
//! Creates the data tables, the audit table and their indexes.

use crate::config::IngestConfig;
use crate::error::Result;
use crate::store::Store;
use colored::Colorize;
use tracing::info;

/// Create the schema. Safe to run against an existing database.
pub fn run(config: &IngestConfig) -> Result<()> {
    let store = Store::open(&config.database_path)?;
    store.init_schema()?;

    info!(path = %config.database_path.display(), "Schema initialised");
    println!(
        "{} Initialised {}",
        "✓".green(),
        config.database_path.display()
    );

    Ok(())
}
