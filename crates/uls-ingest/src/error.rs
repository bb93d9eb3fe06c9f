//! Error types for the ingestion engine
//!
//! Line-level data problems never surface here: they become nulls or
//! skipped-line counts. These errors cover structural faults only.

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Store operation failed
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Source file could not be opened, decompressed or read
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] uls_common::UlsError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check the ULS_* environment variables or command-line flags.")]
    Config(String),

    /// A record-type contract is inconsistent with its row layout
    #[error("Invalid contract for {record_type}: {reason}")]
    InvalidContract { record_type: String, reason: String },

    /// No contract registered for a record type
    #[error("No contract registered for record type {0}")]
    MissingContract(String),

    /// A table stopped accepting rows after repeated flush failures
    #[error("Table '{table}' halted: {reason}")]
    TableHalted { table: String, reason: String },
}

impl IngestError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a contract validation error
    pub fn invalid_contract(record_type: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidContract {
            record_type: record_type.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = IngestError::config("batch size must be greater than zero");
        assert!(err.to_string().contains("batch size must be greater than zero"));
        assert!(err.to_string().contains("ULS_"));

        let err = IngestError::invalid_contract("FR", "duplicate offset 9");
        assert_eq!(err.to_string(), "Invalid contract for FR: duplicate offset 9");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "HD.dat");
        let err: IngestError = io.into();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
