//! ULS bulk record ingestion
//!
//! Loads FCC Universal Licensing System bulk extract files into SQLite.
//!
//! # Overview
//!
//! Each source file holds one record type, one record per line, fields split
//! by a single delimiter with the record-type marker first:
//!
//! - **Contracts**: immutable per-record-type field layouts ([`contract`])
//! - **Dispatch**: marker check against the file's declared type ([`dispatch`])
//! - **Mapping**: positional extraction and lenient coercion ([`mapper`])
//! - **Writing**: per-table batches, one transaction each ([`writer`], [`store`])
//! - **Reporting**: one audit row per file and a run summary ([`reporter`])
//!
//! [`pipeline::Pipeline`] ties these together. Conflicting license rows are
//! resolved at read time through [`policy`].

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod commands;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod policy;
pub mod record;
pub mod reporter;
pub mod source;
pub mod store;
pub mod writer;

pub use config::IngestConfig;
pub use contract::{Contract, ContractSet};
pub use error::{IngestError, Result};
pub use pipeline::Pipeline;
pub use record::{Record, Value};
pub use reporter::{ExitStatus, RunSummary, Stats};
pub use store::Store;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use uls_common::RecordType;

/// ULS bulk extract loader
#[derive(Parser, Debug)]
#[command(name = "uls-ingest")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file
    #[arg(long, env = "ULS_DATABASE_PATH", global = true)]
    pub database: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create tables and indexes
    Init,

    /// Ingest source files or directories
    Run {
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Rows buffered per table before a flush
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Field delimiter (one character, or \t)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Record type marker for every given file (HD, EN, FR, LO, AN, AP)
        #[arg(long = "type", value_name = "MARKER")]
        record_type: Option<RecordType>,
    },

    /// Show table row counts and recent audit entries
    Stats {
        /// Number of audit entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}
