//! Error types shared across the ULS loader

use thiserror::Error;

/// Result type alias for shared ULS operations
pub type Result<T> = std::result::Result<T, UlsError>;

/// Main error type for shared ULS operations
#[derive(Error, Debug)]
pub enum UlsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown record type marker: '{0}'")]
    UnknownRecordType(String),

    #[error("Unknown table: '{0}'")]
    UnknownTable(String),

    #[error("Cannot classify source file '{0}': expected a name starting with a record type marker (HD, EN, FR, LO, AN, AP)")]
    UnclassifiedFile(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
