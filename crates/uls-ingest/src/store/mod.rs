//! SQLite store
//!
//! The loader is the only writer. The database runs in WAL mode so read-only
//! lookup tools can query while a run is in progress.

pub mod schema;

use crate::error::Result;
use crate::record::{fields_for, LicenseRow, Record};
use crate::reporter::AuditEntry;
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use uls_common::types::AUDIT_TABLE;
use uls_common::Table;

/// How long a connection waits on a locked database.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination for flushed batches.
///
/// `insert_batch` must be all-or-nothing: on error, none of `rows` may be
/// visible in `table`.
pub trait BatchSink {
    /// Insert `rows` into `table` atomically, returning the number inserted.
    fn insert_batch(&mut self, table: Table, rows: &[Record]) -> Result<usize>;
}

/// Row count for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: Table,
    pub rows: u64,
}

/// A license row as stored, with its insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredLicense {
    pub id: i64,
    #[serde(flatten)]
    pub row: LicenseRow,
}

pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        debug!(path = %path.display(), "Opened store");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory store (for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Create tables and indexes if they do not exist.
    pub fn init_schema(&self) -> Result<()> {
        schema::init_schema(&self.conn)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn count(&self, table: Table) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub fn table_counts(&self) -> Result<Vec<TableCount>> {
        Table::ALL
            .into_iter()
            .map(|table| {
                Ok(TableCount {
                    table,
                    rows: self.count(table)?,
                })
            })
            .collect()
    }

    /// Write one audit row, returning its id.
    pub fn record_audit(&self, entry: &AuditEntry) -> Result<i64> {
        self.conn.execute(
            &format!(
                "INSERT INTO {AUDIT_TABLE} (
                    run_id, file_name, file_path, file_type, file_size,
                    records_processed, records_skipped, success, error_message, ingested_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                entry.run_id,
                entry.file_name,
                entry.file_path,
                entry.file_type,
                to_sql_int(entry.file_size),
                to_sql_int(entry.records_processed),
                to_sql_int(entry.records_skipped),
                entry.success,
                entry.error_message,
                entry.ingested_at.to_rfc3339(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent audit entries, newest first.
    pub fn recent_audits(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, run_id, file_name, file_path, file_type, file_size,
                    records_processed, records_skipped, success, error_message, ingested_at
             FROM {AUDIT_TABLE}
             ORDER BY id DESC
             LIMIT ?1"
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map([limit], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    file_name: row.get(2)?,
                    file_path: row.get(3)?,
                    file_type: row.get(4)?,
                    file_size: from_sql_int(row.get(5)?),
                    records_processed: from_sql_int(row.get(6)?),
                    records_skipped: from_sql_int(row.get(7)?),
                    success: row.get(8)?,
                    error_message: row.get(9)?,
                    ingested_at: parse_timestamp(10, row.get(10)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// All license rows for `call_sign`, in insertion order.
    ///
    /// Several rows per license are normal; see [`crate::policy`] for
    /// picking the authoritative one.
    pub fn licenses_by_call_sign(&self, call_sign: &str) -> Result<Vec<StoredLicense>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM licenses WHERE call_sign = ?1 ORDER BY id")?;

        let rows = stmt
            .query_map([call_sign], |row| {
                Ok(StoredLicense {
                    id: row.get("id")?,
                    row: LicenseRow::from_sql_row(row)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl BatchSink for Store {
    fn insert_batch(&mut self, table: Table, rows: &[Record]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let fields = fields_for(table.record_type());
        let chunk_rows = schema::rows_per_statement(fields.len());

        let tx = self.conn.transaction()?;
        for chunk in rows.chunks(chunk_rows) {
            debug_assert!(chunk.iter().all(|r| r.table() == table));

            let sql = schema::insert_sql(table, fields, chunk.len());
            let mut stmt = tx.prepare_cached(&sql)?;
            let params: Vec<&dyn ToSql> = chunk.iter().flat_map(Record::bind_params).collect();
            stmt.execute(params_from_iter(params))?;
        }
        tx.commit()?;

        Ok(rows.len())
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
