//! End-to-end tests for the ingestion pipeline
//!
//! These tests run real source files through a SQLite store:
//! - Positional mapping of license and frequency records
//! - Batch boundaries and flush counts
//! - Batch atomicity, retry and table halting
//! - Crash and rerun behaviour
//! - Gzip input and file-level failures

#![allow(clippy::unwrap_used, clippy::expect_used)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uls_common::{RecordType, Table};
use uls_ingest::error::Result;
use uls_ingest::reporter::{AuditEntry, AuditLog, ExitStatus};
use uls_ingest::source::{discover, SourceFile};
use uls_ingest::store::BatchSink;
use uls_ingest::writer::BatchWriter;
use uls_ingest::{Contract, ContractSet, IngestConfig, IngestError, Pipeline, Record, Store};

// ============================================================================
// Helpers
// ============================================================================

/// A full-width line for `record_type` with the given body fields set.
fn line(record_type: RecordType, fields: &[(usize, &str)]) -> String {
    let width = Contract::standard(record_type).width();
    let mut body = vec![""; width];
    for &(offset, value) in fields {
        body[offset] = value;
    }
    format!("{}|{}", record_type.marker(), body.join("|"))
}

fn write_lines(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(&path, contents).unwrap();
    path
}

fn config(batch_size: usize) -> IngestConfig {
    IngestConfig {
        batch_size,
        ..IngestConfig::default()
    }
}

fn memory_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.init_schema().unwrap();
    store
}

fn file_store(dir: &Path) -> Store {
    let store = Store::open(dir.join("uls.db")).unwrap();
    store.init_schema().unwrap();
    store
}

fn pipeline(store: Store, batch_size: usize) -> Pipeline<Store> {
    Pipeline::new(store, ContractSet::standard(), &config(batch_size)).unwrap()
}

fn entity_lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|n| {
            let id = n.to_string();
            let call_sign = format!("K{n}");
            line(RecordType::Entity, &[(0, id.as_str()), (3, call_sign.as_str()), (6, "Example Licensee")])
        })
        .collect()
}

// ============================================================================
// Mapping
// ============================================================================

#[test]
fn test_license_lines_with_missing_trailing_date() {
    let dir = TempDir::new().unwrap();
    let full_a = line(
        RecordType::License,
        &[(0, "1001"), (3, "W1AW"), (4, "A"), (5, "HA"), (6, "01/15/2020"), (7, "01/15/2030")],
    );
    let full_b = line(
        RecordType::License,
        &[(0, "1002"), (3, "K2ABC"), (4, "A"), (5, "HA"), (6, "03/02/2019"), (7, "03/02/2029")],
    );
    // Ends right after the grant date
    let short = "HD|1003|||N3XYZ|A|HA|05/05/2021".to_string();
    let path = write_lines(dir.path(), "HD.dat", &[full_a, full_b, short]);

    let sources = discover(&[path], None).unwrap();
    let (summary, store) = pipeline(memory_store(), 100).run(&sources);

    assert_eq!(summary.exit_status(), ExitStatus::Success);
    assert_eq!(store.count(Table::Licenses).unwrap(), 3);

    let with_expiration: i64 = store
        .conn()
        .query_row("SELECT COUNT(expired_date) FROM licenses", [], |row| row.get(0))
        .unwrap();
    assert_eq!(with_expiration, 2);

    let short_row = store.licenses_by_call_sign("N3XYZ").unwrap();
    assert_eq!(short_row.len(), 1);
    assert_eq!(short_row[0].row.grant_date.as_deref(), Some("05/05/2021"));
    assert_eq!(short_row[0].row.expired_date, None);
}

#[test]
fn test_frequency_taken_from_its_own_offset() {
    let dir = TempDir::new().unwrap();
    let fr = line(
        RecordType::Frequency,
        &[(0, "3456789"), (3, "KA1234"), (5, "1"), (6, "1"), (9, "154.4525"), (14, "100")],
    );
    let path = write_lines(dir.path(), "FR.dat", &[fr]);

    let sources = discover(&[path], None).unwrap();
    let (_, store) = pipeline(memory_store(), 100).run(&sources);

    let (assigned, power, location): (f64, f64, i64) = store
        .conn()
        .query_row(
            "SELECT frequency_assigned, power_output, location_number FROM frequencies",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert!((assigned - 154.4525).abs() < 1e-9);
    assert!((power - 100.0).abs() < 1e-9);
    assert_eq!(location, 1);
}

#[test]
fn test_non_numeric_values_become_null() {
    let dir = TempDir::new().unwrap();
    let fr = line(RecordType::Frequency, &[(0, "1"), (5, "one"), (9, "n/a"), (14, "")]);
    let next = line(RecordType::Frequency, &[(0, "2"), (9, "450.0")]);
    let path = write_lines(dir.path(), "FR.dat", &[fr, next]);

    let (summary, store) = pipeline(memory_store(), 100).run(&discover(&[path], None).unwrap());
    assert_eq!(summary.files[0].parsed, 2);

    let nulls: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM frequencies
             WHERE frequency_assigned IS NULL AND location_number IS NULL AND power_output IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(nulls, 1);
}

#[test]
fn test_mismatched_and_malformed_lines_are_counted() {
    let dir = TempDir::new().unwrap();
    let lines = vec![
        line(RecordType::ApplicationPurpose, &[(0, "1"), (4, "NE")]),
        line(RecordType::Entity, &[(0, "2")]),
        "AP".to_string(),
        String::new(),
        line(RecordType::ApplicationPurpose, &[(0, "3"), (4, "RO")]),
    ];
    let path = write_lines(dir.path(), "AP.dat", &lines);

    let (summary, store) = pipeline(memory_store(), 100).run(&discover(&[path], None).unwrap());

    let report = &summary.files[0];
    assert!(report.success);
    assert_eq!(report.parsed, 2);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.skipped_by_reason["marker_mismatch"], 1);
    assert_eq!(report.skipped_by_reason["too_short"], 1);
    assert_eq!(report.skipped_by_reason["blank"], 1);

    assert_eq!(store.count(Table::ApplicationPurpose).unwrap(), 2);
    assert_eq!(store.count(Table::Entities).unwrap(), 0);

    let table = summary.tables.table(Table::ApplicationPurpose).unwrap();
    assert_eq!(table.counters.skipped, 3);
}

// ============================================================================
// Batching
// ============================================================================

#[test]
fn test_ten_thousand_entities_in_batches_of_one_thousand() {
    let dir = TempDir::new().unwrap();
    let path = write_lines(dir.path(), "EN.dat", &entity_lines(10_000));

    let (summary, store) = pipeline(memory_store(), 1000).run(&discover(&[path], None).unwrap());

    let entities = summary.tables.table(Table::Entities).unwrap();
    assert_eq!(entities.counters.flushes, 10);
    assert_eq!(entities.counters.inserted, 10_000);
    assert_eq!(store.count(Table::Entities).unwrap(), 10_000);
}

#[test]
fn test_same_file_twice_doubles_rows() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (0..25)
        .map(|n| line(RecordType::License, &[(0, n.to_string().as_str()), (3, "W1AW")]))
        .collect();
    let path = write_lines(dir.path(), "HD.dat", &lines);
    let sources = discover(&[path], None).unwrap();

    let (_, store) = pipeline(file_store(dir.path()), 10).run(&sources);
    assert_eq!(store.count(Table::Licenses).unwrap(), 25);
    drop(store);

    let (_, store) = pipeline(file_store(dir.path()), 10).run(&sources);
    assert_eq!(store.count(Table::Licenses).unwrap(), 50);
    assert_eq!(store.recent_audits(10).unwrap().len(), 2);
}

#[test]
fn test_run_over_directory_fills_every_table() {
    let dir = TempDir::new().unwrap();
    for record_type in RecordType::ALL {
        let name = format!("{}.dat", record_type.marker());
        write_lines(dir.path(), &name, &[line(record_type, &[(0, "42"), (3, "W1AW")])]);
    }
    write_lines(dir.path(), "counts", &["not a source".to_string()]);

    let sources = discover(&[dir.path().to_path_buf()], None).unwrap();
    assert_eq!(sources.len(), 6);

    let (summary, store) = pipeline(memory_store(), 100).run(&sources);
    assert_eq!(summary.exit_status(), ExitStatus::Success);
    for table in Table::ALL {
        assert_eq!(store.count(table).unwrap(), 1, "table {table}");
    }
    assert_eq!(store.count_rows_for_system_id("42"), 6);
}

trait SystemIdCount {
    fn count_rows_for_system_id(&self, id: &str) -> i64;
}

impl SystemIdCount for Store {
    fn count_rows_for_system_id(&self, id: &str) -> i64 {
        Table::ALL
            .iter()
            .map(|table| {
                self.conn()
                    .query_row(
                        &format!("SELECT COUNT(*) FROM {} WHERE system_id = ?1", table.as_str()),
                        [id],
                        |row| row.get::<_, i64>(0),
                    )
                    .unwrap()
            })
            .sum()
    }
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_failed_batch_leaves_table_at_pre_batch_count() {
    let dir = TempDir::new().unwrap();
    let store = memory_store();
    store
        .conn()
        .execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON entities
             WHEN NEW.entity_name = 'BOOM'
             BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
        )
        .unwrap();

    let mut lines = entity_lines(12);
    lines[7] = line(RecordType::Entity, &[(0, "7"), (6, "BOOM")]);
    let path = write_lines(dir.path(), "EN.dat", &lines);

    let (summary, store) = pipeline(store, 5).run(&discover(&[path], None).unwrap());

    // First batch committed; the second failed as a whole and halted the table
    assert_eq!(store.count(Table::Entities).unwrap(), 5);

    let entities = summary.tables.table(Table::Entities).unwrap();
    assert_eq!(entities.counters.inserted, 5);
    assert_eq!(entities.counters.dropped, 7);
    assert!(entities.halted.as_deref().unwrap().contains("forced failure"));

    // Failed, but five of its rows were committed before the halt
    assert!(!summary.files[0].success);
    assert_eq!(summary.files[0].committed, 5);
    assert_eq!(summary.exit_status(), ExitStatus::SuccessWithWarnings);
    assert_eq!(summary.exit_status().code(), 0);

    let audits = store.recent_audits(1).unwrap();
    assert!(!audits[0].success);
    assert!(audits[0].error_message.as_deref().unwrap().contains("halted"));
}

#[test]
fn test_file_for_halted_table_is_not_read() {
    let dir = TempDir::new().unwrap();
    let store = memory_store();
    store
        .conn()
        .execute_batch("DROP TABLE entities;")
        .unwrap();

    let first = write_lines(dir.path(), "EN.dat", &entity_lines(3));
    let second = write_lines(dir.path(), "EN.dat.gz", &["not gzip data".to_string()]);

    let (summary, _) = pipeline(store, 100).run(&discover(&[first, second], None).unwrap());

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.files[0].parsed, 3);

    // Unread: an open would have reported the bad gzip header instead
    let skipped = &summary.files[1];
    assert!(!skipped.success);
    assert_eq!(skipped.parsed, 0);
    assert_eq!(skipped.skipped, 0);
    assert!(skipped.error.as_deref().unwrap().contains("Table 'entities' halted"));

    let entities = summary.tables.table(Table::Entities).unwrap();
    assert_eq!(entities.counters.dropped, 3);
    assert_eq!(summary.exit_status(), ExitStatus::Failure);
}

#[test]
fn test_halted_table_does_not_stop_other_tables() {
    let dir = TempDir::new().unwrap();
    let store = memory_store();
    store
        .conn()
        .execute_batch("DROP TABLE licenses;")
        .unwrap();

    let hd = write_lines(dir.path(), "HD.dat", &[line(RecordType::License, &[(0, "1")])]);
    let en = write_lines(dir.path(), "EN.dat", &entity_lines(3));

    let (summary, store) = pipeline(store, 100).run(&discover(&[hd, en], None).unwrap());

    assert_eq!(summary.exit_status(), ExitStatus::SuccessWithWarnings);
    assert_eq!(summary.tables.halted().count(), 1);
    assert_eq!(store.count(Table::Entities).unwrap(), 3);
}

/// Wraps a store and fails the first `failures` batch inserts.
struct FlakySink {
    store: Store,
    failures: usize,
    calls: usize,
}

impl BatchSink for FlakySink {
    fn insert_batch(&mut self, table: Table, rows: &[Record]) -> Result<usize> {
        self.calls += 1;
        if self.failures > 0 {
            self.failures -= 1;
            return Err(IngestError::config("database is locked"));
        }
        self.store.insert_batch(table, rows)
    }
}

impl AuditLog for FlakySink {
    fn record_audit(&self, entry: &AuditEntry) -> Result<i64> {
        self.store.record_audit(entry)
    }
}

#[test]
fn test_failed_flush_is_retried_once() {
    let dir = TempDir::new().unwrap();
    let path = write_lines(dir.path(), "EN.dat", &entity_lines(4));
    let sink = FlakySink {
        store: memory_store(),
        failures: 1,
        calls: 0,
    };

    let pipeline = Pipeline::new(sink, ContractSet::standard(), &config(4)).unwrap();
    let (summary, sink) = pipeline.run(&discover(&[path], None).unwrap());

    assert_eq!(summary.exit_status(), ExitStatus::Success);
    assert_eq!(sink.calls, 2);
    assert_eq!(sink.store.count(Table::Entities).unwrap(), 4);
}

#[test]
fn test_zero_flush_retries_halts_on_first_failure() {
    let dir = TempDir::new().unwrap();
    let path = write_lines(dir.path(), "EN.dat", &entity_lines(4));
    let sink = FlakySink {
        store: memory_store(),
        failures: 1,
        calls: 0,
    };
    let config = IngestConfig {
        flush_retries: 0,
        ..config(4)
    };

    let pipeline = Pipeline::new(sink, ContractSet::standard(), &config).unwrap();
    let (summary, sink) = pipeline.run(&discover(&[path], None).unwrap());

    assert_eq!(sink.calls, 1);
    assert_eq!(sink.store.count(Table::Entities).unwrap(), 0);
    assert!(summary.tables.table(Table::Entities).unwrap().halted.is_some());
    assert_eq!(summary.exit_status(), ExitStatus::Failure);
}

#[test]
fn test_unreadable_file_is_audited_and_run_continues() {
    let dir = TempDir::new().unwrap();
    let bad_gz = dir.path().join("LO.dat.gz");
    std::fs::write(&bad_gz, b"this is not gzip data").unwrap();
    let missing = SourceFile::new(dir.path().join("AN.dat"), RecordType::Antenna);
    let good = write_lines(dir.path(), "HD.dat", &[line(RecordType::License, &[(0, "1")])]);

    let mut sources = discover(&[bad_gz, good], None).unwrap();
    sources.push(missing);

    let (summary, store) = pipeline(memory_store(), 100).run(&sources);

    assert_eq!(summary.files.len(), 3);
    assert_eq!(summary.failed_files().count(), 2);
    assert_eq!(summary.exit_status(), ExitStatus::SuccessWithWarnings);
    assert_eq!(store.count(Table::Licenses).unwrap(), 1);

    let audits = store.recent_audits(10).unwrap();
    assert_eq!(audits.len(), 3);
    assert_eq!(audits.iter().filter(|a| !a.success).count(), 2);
    assert!(audits
        .iter()
        .filter(|a| !a.success)
        .all(|a| a.error_message.is_some()));
}

#[test]
fn test_gzip_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("AP.dat.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
    for n in 0..3 {
        writeln!(encoder, "{}", line(RecordType::ApplicationPurpose, &[(0, n.to_string().as_str())])).unwrap();
    }
    encoder.finish().unwrap();

    let (summary, store) = pipeline(memory_store(), 2).run(&discover(&[path], None).unwrap());

    assert!(summary.files[0].success);
    assert_eq!(store.count(Table::ApplicationPurpose).unwrap(), 3);
}

// ============================================================================
// Crash and rerun
// ============================================================================

#[test]
fn test_crash_after_flushes_then_rerun() {
    let dir = TempDir::new().unwrap();
    let lines = entity_lines(350);
    let path = write_lines(dir.path(), "EN.dat", &lines);

    // Simulated crash: the writer is dropped with 50 rows still buffered
    {
        let parser = pipeline(memory_store(), 100);
        let mut writer = BatchWriter::new(file_store(dir.path()), 100);
        for text in &lines {
            if let uls_ingest::mapper::LineOutcome::Parsed(record) =
                parser.parse_line(text, RecordType::Entity)
            {
                writer.push(record);
            }
        }
        assert_eq!(writer.counters(Table::Entities).flushes, 3);
    }

    let store = file_store(dir.path());
    let after_crash = store.count(Table::Entities).unwrap();
    assert_eq!(after_crash, 300);
    drop(store);

    let (summary, store) = pipeline(file_store(dir.path()), 100).run(&discover(&[path], None).unwrap());
    assert_eq!(summary.exit_status(), ExitStatus::Success);
    assert!(store.count(Table::Entities).unwrap() >= after_crash);
    assert_eq!(store.count(Table::Entities).unwrap(), 650);
}
