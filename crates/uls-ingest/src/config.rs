//! Configuration for ingestion runs
//!
//! Values come from defaults, then `ULS_*` environment variables (a `.env`
//! file is honoured), then command-line flags applied by the binary.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Default SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "uls.db";

/// Rows buffered per table before a flush.
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// Upper bound for `batch_size`; the pending buffer is the only memory throttle.
pub const MAX_BATCH_SIZE: usize = 100_000;

/// Field separator used by the public-access extracts.
pub const DEFAULT_DELIMITER: char = '|';

/// Extra attempts after a failed flush before the table is halted.
pub const DEFAULT_FLUSH_RETRIES: u32 = 1;

/// Audit entries listed by the stats query.
pub const DEFAULT_AUDIT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// SQLite database file the loader writes to
    pub database_path: PathBuf,

    /// Rows buffered per destination table before a flush
    pub batch_size: usize,

    /// Single-character field separator
    pub delimiter: char,

    /// Retries for a failed flush before the table is halted
    #[serde(default = "default_flush_retries")]
    pub flush_retries: u32,

    /// Number of recent audit entries reported by `stats`
    #[serde(default = "default_audit_limit")]
    pub audit_limit: usize,
}

fn default_flush_retries() -> u32 {
    DEFAULT_FLUSH_RETRIES
}

fn default_audit_limit() -> usize {
    DEFAULT_AUDIT_LIMIT
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: DEFAULT_DELIMITER,
            flush_retries: DEFAULT_FLUSH_RETRIES,
            audit_limit: DEFAULT_AUDIT_LIMIT,
        }
    }
}

impl IngestConfig {
    /// Load config from the process environment.
    ///
    /// Environment variables:
    /// - `ULS_DATABASE_PATH`: SQLite database file
    /// - `ULS_BATCH_SIZE`: rows per flush
    /// - `ULS_DELIMITER`: field separator (one character)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults; an unusable delimiter
    /// is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("ULS_DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(size) = lookup("ULS_BATCH_SIZE") {
            match size.trim().parse() {
                Ok(size) => config.batch_size = size,
                Err(_) => tracing::warn!(value = %size, "Ignoring unparseable ULS_BATCH_SIZE"),
            }
        }

        if let Some(delimiter) = lookup("ULS_DELIMITER") {
            config.delimiter = parse_delimiter(&delimiter)?;
        }

        Ok(config)
    }

    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(IngestError::config("batch size must be greater than zero"));
        }

        if self.batch_size > MAX_BATCH_SIZE {
            return Err(IngestError::config(format!(
                "batch size {} exceeds the maximum of {}",
                self.batch_size, MAX_BATCH_SIZE
            )));
        }

        if !self.delimiter.is_ascii() || matches!(self.delimiter, '\n' | '\r') {
            return Err(IngestError::config(format!(
                "delimiter {:?} must be a single ASCII character other than a line break",
                self.delimiter
            )));
        }

        if self.audit_limit == 0 {
            return Err(IngestError::config("audit limit must be greater than zero"));
        }

        Ok(())
    }

    /// Total attempts for one flush, including the first.
    pub fn flush_attempts(&self) -> u32 {
        self.flush_retries.saturating_add(1)
    }
}

/// Parse a delimiter given as text. Accepts exactly one character, or the
/// escape `\t` for tab.
pub fn parse_delimiter(raw: &str) -> Result<char> {
    if raw == "\\t" {
        return Ok('\t');
    }

    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(IngestError::config(format!(
            "delimiter must be exactly one character, got {raw:?}"
        ))),
    }
}
