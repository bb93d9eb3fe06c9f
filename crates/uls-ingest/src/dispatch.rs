//! Record type dispatch
//!
//! Reads the leading marker of a line and selects the contract for it. Each
//! source file holds a single record type, so the dispatcher is told which
//! marker to expect and flags, but never corrects, lines that disagree.

use crate::contract::{Contract, ContractSet};
use serde::Serialize;
use uls_common::{RecordType, Table};

/// Why a line was not turned into a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Empty or whitespace-only line
    Blank,
    /// Bytes that are not valid UTF-8
    Undecodable,
    /// Leading marker differs from the file's record type
    MarkerMismatch { found: String },
    /// Marker has no registered contract
    Unrecognized { marker: String },
    /// Fewer body fields than the contract requires
    TooShort { fields: usize, required: usize },
}

impl SkipReason {
    /// Stable short name, used as a counter key.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Blank => "blank",
            SkipReason::Undecodable => "undecodable",
            SkipReason::MarkerMismatch { .. } => "marker_mismatch",
            SkipReason::Unrecognized { .. } => "unrecognized",
            SkipReason::TooShort { .. } => "too_short",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Blank => write!(f, "blank line"),
            SkipReason::Undecodable => write!(f, "line is not valid UTF-8"),
            SkipReason::MarkerMismatch { found } => write!(f, "unexpected marker '{found}'"),
            SkipReason::Unrecognized { marker } => write!(f, "no contract for marker '{marker}'"),
            SkipReason::TooShort { fields, required } => {
                write!(f, "{fields} fields after marker, {required} required")
            },
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Dispatched<'a> {
    pub table: Table,
    pub contract: &'a Contract,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    contracts: ContractSet,
    delimiter: char,
}

impl Dispatcher {
    pub fn new(contracts: ContractSet, delimiter: char) -> Self {
        Self {
            contracts,
            delimiter,
        }
    }

    pub fn contracts(&self) -> &ContractSet {
        &self.contracts
    }

    /// The leading delimited field of `line`, whitespace-trimmed.
    pub fn marker<'l>(&self, line: &'l str) -> &'l str {
        line.split(self.delimiter).next().unwrap_or_default().trim()
    }

    /// Route `line` for a file declared as `expected`.
    pub fn dispatch(&self, line: &str, expected: RecordType) -> Result<Dispatched<'_>, SkipReason> {
        if line.trim().is_empty() {
            return Err(SkipReason::Blank);
        }

        let marker = self.marker(line);
        if marker != expected.marker() {
            return Err(SkipReason::MarkerMismatch {
                found: marker.to_string(),
            });
        }

        let contract = self
            .contracts
            .get(expected)
            .map_err(|_| SkipReason::Unrecognized {
                marker: marker.to_string(),
            })?;

        Ok(Dispatched {
            table: contract.table,
            contract,
        })
    }
}
