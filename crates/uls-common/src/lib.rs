//! ULS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the ULS loader workspace.
//!
//! # Overview
//!
//! This crate provides functionality shared by the ingestion engine and by
//! read-only consumers of the resulting store:
//!
//! - **Error Handling**: Common error type and result alias
//! - **Logging**: `tracing` subscriber setup (console, rolling file, JSON)
//! - **Types**: Record type markers and destination table names
//!
//! # Example
//!
//! ```no_run
//! use uls_common::types::RecordType;
//!
//! let record_type: RecordType = "FR".parse().unwrap();
//! assert_eq!(record_type.table().as_str(), "frequencies");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, UlsError};
pub use types::{RecordType, Table};
