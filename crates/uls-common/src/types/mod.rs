//! Common types used across the ULS loader
//!
//! ULS public-access extracts ship one `.dat` file per record type. Every
//! line starts with a two-letter marker naming its record type, and each
//! record type is loaded into exactly one destination table.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::UlsError;

// ============================================================================
// Record Types
// ============================================================================

/// The six record types the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// `HD` - application/license header
    License,
    /// `EN` - licensee and contact entities
    Entity,
    /// `FR` - assigned frequencies
    Frequency,
    /// `LO` - transmitter and operating locations
    Location,
    /// `AN` - antenna specifications
    Antenna,
    /// `AP` - application purpose codes
    ApplicationPurpose,
}

impl RecordType {
    /// All record types, in the order a full extract is loaded.
    pub const ALL: [RecordType; 6] = [
        RecordType::License,
        RecordType::Entity,
        RecordType::Frequency,
        RecordType::Location,
        RecordType::Antenna,
        RecordType::ApplicationPurpose,
    ];

    /// The leading marker field that identifies this record type on a line.
    pub fn marker(self) -> &'static str {
        match self {
            RecordType::License => "HD",
            RecordType::Entity => "EN",
            RecordType::Frequency => "FR",
            RecordType::Location => "LO",
            RecordType::Antenna => "AN",
            RecordType::ApplicationPurpose => "AP",
        }
    }

    /// Look up a record type by its marker (case-sensitive, as written in the data).
    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rt| rt.marker() == marker)
    }

    /// Destination table for rows of this record type.
    pub fn table(self) -> Table {
        match self {
            RecordType::License => Table::Licenses,
            RecordType::Entity => Table::Entities,
            RecordType::Frequency => Table::Frequencies,
            RecordType::Location => Table::Locations,
            RecordType::Antenna => Table::Antennas,
            RecordType::ApplicationPurpose => Table::ApplicationPurpose,
        }
    }

    /// Classify a source file by the first two characters of its file name.
    ///
    /// `HD.dat`, `hd.dat.gz` and `FR_20240101.dat` are all accepted.
    pub fn classify_file_name(path: &Path) -> Result<Self, UlsError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        name.get(..2)
            .map(str::to_ascii_uppercase)
            .and_then(|prefix| Self::from_marker(&prefix))
            .ok_or(UlsError::UnclassifiedFile(name))
    }
}

impl std::str::FromStr for RecordType {
    type Err = UlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_marker(&s.trim().to_ascii_uppercase())
            .ok_or_else(|| UlsError::UnknownRecordType(s.to_string()))
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.marker())
    }
}

// ============================================================================
// Destination Tables
// ============================================================================

/// Name of the per-file audit table.
pub const AUDIT_TABLE: &str = "ingest_audit";

/// Destination tables for parsed rows.
///
/// Rows in every table carry a `system_id` correlation key. It is shared
/// across tables and across runs and is never a uniqueness constraint:
/// several rows per `system_id` are normal and must be aggregated by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Licenses,
    Entities,
    Frequencies,
    Locations,
    Antennas,
    ApplicationPurpose,
}

impl Table {
    /// All data tables.
    pub const ALL: [Table; 6] = [
        Table::Licenses,
        Table::Entities,
        Table::Frequencies,
        Table::Locations,
        Table::Antennas,
        Table::ApplicationPurpose,
    ];

    /// SQL table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Licenses => "licenses",
            Table::Entities => "entities",
            Table::Frequencies => "frequencies",
            Table::Locations => "locations",
            Table::Antennas => "antennas",
            Table::ApplicationPurpose => "application_purpose",
        }
    }

    /// The record type whose rows land in this table.
    pub fn record_type(self) -> RecordType {
        match self {
            Table::Licenses => RecordType::License,
            Table::Entities => RecordType::Entity,
            Table::Frequencies => RecordType::Frequency,
            Table::Locations => RecordType::Location,
            Table::Antennas => RecordType::Antenna,
            Table::ApplicationPurpose => RecordType::ApplicationPurpose,
        }
    }
}

impl std::str::FromStr for Table {
    type Err = UlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UlsError::UnknownTable(s.to_string()))
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
