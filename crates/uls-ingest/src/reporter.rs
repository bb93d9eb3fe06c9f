//! Progress and checkpoint reporting
//!
//! One audit row is written per source file once the file is finished,
//! whether it loaded or failed. There is no intra-file resume point: a
//! failed file is read again from the start on the next run, and rows it
//! committed earlier are duplicated. Readers aggregate by key.

use crate::error::Result;
use crate::store::{Store, TableCount};
use crate::writer::WriterSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uls_common::RecordType;

/// One row of the `ingest_audit` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub run_id: String,
    pub file_name: String,
    pub file_path: String,
    /// Record type marker of the file
    pub file_type: String,
    pub file_size: u64,
    pub records_processed: u64,
    pub records_skipped: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

impl AuditEntry {
    /// A successful entry with zero counts, timestamped now.
    pub fn new(
        run_id: impl Into<String>,
        file_path: impl AsRef<Path>,
        file_type: impl Into<String>,
        file_size: u64,
    ) -> Self {
        let file_path = file_path.as_ref();
        Self {
            id: None,
            run_id: run_id.into(),
            file_name: file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            file_path: file_path.display().to_string(),
            file_type: file_type.into(),
            file_size,
            records_processed: 0,
            records_skipped: 0,
            success: true,
            error_message: None,
            ingested_at: Utc::now(),
        }
    }
}

/// Where audit entries are written.
pub trait AuditLog {
    fn record_audit(&self, entry: &AuditEntry) -> Result<i64>;
}

impl AuditLog for Store {
    fn record_audit(&self, entry: &AuditEntry) -> Result<i64> {
        Store::record_audit(self, entry)
    }
}

/// Result of ingesting one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub record_type: RecordType,
    pub size_bytes: u64,
    /// Lines turned into rows
    pub parsed: u64,
    /// Rows from this file committed to its table
    pub committed: u64,
    /// Lines skipped, all reasons
    pub skipped: u64,
    /// Skipped lines by reason
    pub skipped_by_reason: BTreeMap<&'static str, u64>,
    pub success: bool,
    pub error: Option<String>,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>, record_type: RecordType, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            record_type,
            size_bytes,
            parsed: 0,
            committed: 0,
            skipped: 0,
            skipped_by_reason: BTreeMap::new(),
            success: true,
            error: None,
        }
    }

    pub fn count_skip(&mut self, kind: &'static str) {
        self.skipped += 1;
        *self.skipped_by_reason.entry(kind).or_default() += 1;
    }

    /// Mark the file failed. The first error wins.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.success = false;
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    /// Loaded cleanly, or failed only after committing some of its rows.
    pub fn processed(&self) -> bool {
        self.success || self.committed > 0
    }

    pub fn to_audit(&self, run_id: &str) -> AuditEntry {
        AuditEntry {
            records_processed: self.parsed,
            records_skipped: self.skipped,
            success: self.success,
            error_message: self.error.clone(),
            ..AuditEntry::new(run_id, &self.path, self.record_type.marker(), self.size_bytes)
        }
    }
}

/// Collects file reports for a run and writes their audit rows.
#[derive(Debug)]
pub struct Reporter {
    run_id: String,
    files: Vec<FileReport>,
}

impl Reporter {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            files: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Write the audit row for a finished file and keep its report.
    ///
    /// The report is kept even when the audit write fails; the error is
    /// returned so the caller can log it.
    pub fn record<A: AuditLog>(&mut self, log: &A, report: FileReport) -> Result<()> {
        let entry = report.to_audit(&self.run_id);

        if report.success {
            info!(
                file = %report.path.display(),
                record_type = %report.record_type,
                parsed = report.parsed,
                skipped = report.skipped,
                "File ingested"
            );
        } else {
            warn!(
                file = %report.path.display(),
                record_type = %report.record_type,
                parsed = report.parsed,
                committed = report.committed,
                error = report.error.as_deref().unwrap_or_default(),
                "File failed"
            );
        }

        self.files.push(report);
        log.record_audit(&entry)?;
        Ok(())
    }

    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub fn into_summary(self, tables: WriterSummary) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            files: self.files,
            tables,
        }
    }
}

/// Process exit classification for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Success,
    /// At least one file loaded rows, but something failed or was dropped
    SuccessWithWarnings,
    /// No file could be processed
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success | ExitStatus::SuccessWithWarnings => 0,
            ExitStatus::Failure => 1,
        }
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub files: Vec<FileReport>,
    pub tables: WriterSummary,
}

impl RunSummary {
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.success)
    }

    pub fn exit_status(&self) -> ExitStatus {
        if !self.files.iter().any(FileReport::processed) {
            return ExitStatus::Failure;
        }

        let dropped = self.tables.tables.iter().any(|t| t.counters.dropped > 0);
        if self.failed_files().next().is_some() || self.tables.halted().next().is_some() || dropped {
            ExitStatus::SuccessWithWarnings
        } else {
            ExitStatus::Success
        }
    }
}

/// Row counts and recent audit entries, for read-only consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub tables: Vec<TableCount>,
    pub recent_audits: Vec<AuditEntry>,
}

impl Stats {
    pub fn collect(store: &Store, audit_limit: usize) -> Result<Self> {
        Ok(Self {
            tables: store.table_counts()?,
            recent_audits: store.recent_audits(audit_limit)?,
        })
    }

    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}
