//! Ingestion pipeline
//!
//! Drives dispatch, mapping, batching and reporting over source files, one
//! file at a time and one line at a time. Nothing here runs concurrently.
//!
//! Failure handling by level:
//!
//! - line: skipped and counted, the file continues
//! - file: cannot be opened or read, recorded as a failed audit entry, the
//!   run continues with the next file
//! - table: halted by the writer after repeated flush failures, files
//!   feeding it are audited as failed without being read, other tables
//!   continue

use crate::config::IngestConfig;
use crate::contract::ContractSet;
use crate::dispatch::{Dispatcher, SkipReason};
use crate::error::{IngestError, Result};
use crate::mapper::{LineOutcome, Mapper};
use crate::reporter::{AuditLog, FileReport, Reporter, RunSummary};
use crate::source::{LineReader, SourceFile};
use crate::store::BatchSink;
use crate::writer::BatchWriter;
use tracing::{error, info, info_span, trace, warn};
use uls_common::RecordType;
use uuid::Uuid;

/// Lines between progress log entries.
const PROGRESS_INTERVAL: u64 = 500_000;

pub struct Pipeline<S: BatchSink + AuditLog> {
    dispatcher: Dispatcher,
    mapper: Mapper,
    writer: BatchWriter<S>,
    reporter: Reporter,
}

impl<S: BatchSink + AuditLog> Pipeline<S> {
    /// Build a pipeline writing to `sink`.
    pub fn new(sink: S, contracts: ContractSet, config: &IngestConfig) -> Result<Self> {
        config.validate()?;
        contracts.validate()?;

        Ok(Self {
            dispatcher: Dispatcher::new(contracts, config.delimiter),
            mapper: Mapper::new(config.delimiter),
            writer: BatchWriter::new(sink, config.batch_size).with_max_attempts(config.flush_attempts()),
            reporter: Reporter::new(Uuid::new_v4().to_string()),
        })
    }

    pub fn run_id(&self) -> &str {
        self.reporter.run_id()
    }

    pub fn writer(&self) -> &BatchWriter<S> {
        &self.writer
    }

    /// Dispatch and map one decoded line.
    pub fn parse_line(&self, line: &str, expected: RecordType) -> LineOutcome {
        match self.dispatcher.dispatch(line, expected) {
            Ok(dispatched) => self.mapper.map_record(line, dispatched.contract),
            Err(reason) => LineOutcome::Skipped(reason),
        }
    }

    /// Ingest one source file and write its audit entry.
    ///
    /// Rows read before a mid-file read error are still flushed. A file whose
    /// table has already halted is failed without being opened.
    pub fn ingest_file(&mut self, source: &SourceFile) -> FileReport {
        let span = info_span!("ingest_file", file = %source.path.display(), record_type = %source.record_type);
        let _enter = span.enter();

        let table = source.record_type.table();
        let mut report = FileReport::new(&source.path, source.record_type, source.size_bytes);
        let committed_before = self.writer.counters(table).inserted;

        if let Some(reason) = self.writer.halted(table) {
            let err = IngestError::TableHalted {
                table: table.to_string(),
                reason: reason.to_string(),
            };
            warn!(error = %err, "Skipping source file");
            report.fail(err.to_string());
        } else if let Err(err) = self.dispatcher.contracts().get(source.record_type) {
            report.fail(err.to_string());
        } else if let Err(err) = self.consume(source, &mut report) {
            error!(error = %err, line = report.parsed + report.skipped, "Failed reading source file");
            report.fail(err.to_string());
        }

        if let Err(err) = self.writer.flush_table(table) {
            report.fail(err.to_string());
        }
        report.committed = self.writer.counters(table).inserted - committed_before;

        if let Err(err) = self.reporter.record(self.writer.sink(), report.clone()) {
            error!(error = %err, "Failed to write audit entry");
        }

        report
    }

    fn consume(&mut self, source: &SourceFile, report: &mut FileReport) -> Result<()> {
        let expected = source.record_type;
        let table = expected.table();
        let mut lines = LineReader::new(source.open()?);
        let mut mismatch_seen = false;

        info!(size_bytes = source.size_bytes, "Reading source file");

        while let Some(line) = lines.next_line()? {
            let outcome = match line {
                Ok(text) => self.parse_line(text, expected),
                Err(_) => LineOutcome::Skipped(SkipReason::Undecodable),
            };

            match outcome {
                LineOutcome::Parsed(record) => {
                    report.parsed += 1;
                    self.writer.push(record);
                },
                LineOutcome::Skipped(reason) => {
                    if let SkipReason::MarkerMismatch { found } = &reason {
                        if !mismatch_seen {
                            warn!(
                                expected = expected.marker(),
                                found = %found,
                                line = lines.line_number(),
                                "Line marker does not match file record type"
                            );
                            mismatch_seen = true;
                        }
                    }
                    trace!(line = lines.line_number(), reason = %reason, "Skipped line");
                    report.count_skip(reason.kind());
                    self.writer.note_skipped(table);
                },
            }

            if lines.line_number() % PROGRESS_INTERVAL == 0 {
                info!(
                    lines = lines.line_number(),
                    committed = self.writer.counters(table).inserted,
                    "Progress"
                );
            }
        }

        Ok(())
    }

    /// Ingest `sources` in order.
    pub fn ingest_all(&mut self, sources: &[SourceFile]) -> Vec<FileReport> {
        sources.iter().map(|source| self.ingest_file(source)).collect()
    }

    /// Flush remaining buffers and produce the run summary.
    pub fn finish(mut self) -> (RunSummary, S) {
        let tables = self.writer.finish();
        let summary = self.reporter.into_summary(tables);

        info!(
            run_id = %summary.run_id,
            files = summary.files.len(),
            failed = summary.failed_files().count(),
            inserted = summary.tables.total_inserted(),
            "Ingestion run finished"
        );

        (summary, self.writer.into_sink())
    }

    /// Ingest `sources` and finish the run.
    pub fn run(mut self, sources: &[SourceFile]) -> (RunSummary, S) {
        info!(run_id = %self.run_id(), files = sources.len(), "Starting ingestion run");
        self.ingest_all(sources);
        self.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::contract::Contract;
    use crate::reporter::ExitStatus;
    use crate::store::Store;
    use std::path::Path;
    use tempfile::TempDir;
    use uls_common::Table;

    fn pipeline(batch_size: usize) -> Pipeline<Store> {
        let store = Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        let config = IngestConfig {
            batch_size,
            ..IngestConfig::default()
        };
        Pipeline::new(store, ContractSet::standard(), &config).unwrap()
    }

    fn source(dir: &Path, name: &str, contents: &[u8]) -> SourceFile {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        SourceFile::classify(path).unwrap()
    }

    #[test]
    fn test_parse_line_paths() {
        let p = pipeline(10);
        assert!(p.parse_line("AP|1|||W1AW|P", RecordType::ApplicationPurpose).is_parsed());
        assert_eq!(
            p.parse_line("", RecordType::ApplicationPurpose),
            LineOutcome::Skipped(SkipReason::Blank)
        );
        assert_eq!(
            p.parse_line("AP", RecordType::ApplicationPurpose),
            LineOutcome::Skipped(SkipReason::TooShort {
                fields: 0,
                required: 1
            })
        );
    }

    #[test]
    fn test_ingest_file_counts_and_audits() {
        let dir = TempDir::new().unwrap();
        let src = source(
            dir.path(),
            "AP.dat",
            b"AP|1|||W1AW|P|A|01/01/2020\n\nEN|2|||K2X\nAP|3|||N3Y\n\xff\xfe\n",
        );

        let mut p = pipeline(10);
        let report = p.ingest_file(&src);

        assert!(report.success);
        assert_eq!(report.parsed, 2);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.skipped_by_reason["marker_mismatch"], 1);
        assert_eq!(report.skipped_by_reason["undecodable"], 1);

        let counters = p.writer().counters(Table::ApplicationPurpose);
        assert_eq!(counters.inserted, 2);
        assert_eq!(counters.skipped, 3);

        let (summary, store) = p.finish();
        assert_eq!(summary.exit_status(), ExitStatus::Success);
        assert_eq!(store.count(Table::ApplicationPurpose).unwrap(), 2);

        let audits = store.recent_audits(10).unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].records_processed, 2);
        assert_eq!(audits[0].records_skipped, 3);
        assert_eq!(audits[0].file_type, "AP");
        assert_eq!(audits[0].run_id, summary.run_id);
    }

    #[test]
    fn test_missing_file_is_failed_audit_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let missing = SourceFile::new(dir.path().join("HD.dat"), RecordType::License);
        let present = source(dir.path(), "AP.dat", b"AP|1|||W1AW|P\n");

        let (summary, store) = pipeline(10).run(&[missing, present]);

        assert_eq!(summary.files.len(), 2);
        assert!(!summary.files[0].success);
        assert!(summary.files[0].error.is_some());
        assert!(summary.files[1].success);
        assert_eq!(summary.exit_status(), ExitStatus::SuccessWithWarnings);

        let audits = store.recent_audits(10).unwrap();
        assert_eq!(audits.len(), 2);
        assert!(audits.iter().any(|a| !a.success && a.file_name == "HD.dat"));
    }

    #[test]
    fn test_only_failures_is_failure() {
        let dir = TempDir::new().unwrap();
        let missing = SourceFile::new(dir.path().join("FR.dat"), RecordType::Frequency);

        let (summary, _) = pipeline(10).run(&[missing]);
        assert_eq!(summary.exit_status(), ExitStatus::Failure);
    }

    #[test]
    fn test_file_without_contract_fails() {
        let dir = TempDir::new().unwrap();
        let src = source(dir.path(), "AN.dat", b"AN|1\n");

        let store = Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        let contracts = ContractSet::new(vec![Contract::standard(RecordType::License)]).unwrap();
        let mut p = Pipeline::new(store, contracts, &IngestConfig::default()).unwrap();

        let report = p.ingest_file(&src);
        assert!(!report.success);
        assert_eq!(report.parsed, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = Store::open_in_memory().unwrap();
        let config = IngestConfig {
            batch_size: 0,
            ..IngestConfig::default()
        };
        assert!(Pipeline::new(store, ContractSet::standard(), &config).is_err());
    }
}
