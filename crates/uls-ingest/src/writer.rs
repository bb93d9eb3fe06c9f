//! Batch writer
//!
//! Buffers rows per destination table and flushes each buffer as one
//! all-or-nothing batch once it reaches `batch_size`, or when the caller
//! asks. Tables are flushed independently, never in a shared transaction.
//!
//! A failed flush is retried with the same rows. When every attempt fails
//! the table is halted for the rest of the run: its buffer is discarded and
//! counted as dropped, later rows for it are dropped on arrival, and the
//! other tables carry on.
//!
//! Counters move only after a commit. Dropping a writer without calling
//! [`BatchWriter::finish`] discards whatever is still buffered, exactly as a
//! crash would.

use crate::config::DEFAULT_FLUSH_RETRIES;
use crate::error::{IngestError, Result};
use crate::record::Record;
use crate::store::BatchSink;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};
use uls_common::Table;

/// Committed totals for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounters {
    /// Rows committed
    pub inserted: u64,
    /// Source lines skipped for this table
    pub skipped: u64,
    /// Rows discarded because the table halted
    pub dropped: u64,
    /// Successful flushes
    pub flushes: u64,
}

#[derive(Debug, Default)]
struct TableState {
    pending: Vec<Record>,
    pending_skipped: u64,
    counters: TableCounters,
    halted: Option<String>,
}

impl TableState {
    fn fold_skipped(&mut self) {
        self.counters.skipped += std::mem::take(&mut self.pending_skipped);
    }

    fn drop_pending(&mut self) {
        self.counters.dropped += self.pending.len() as u64;
        self.pending.clear();
        self.fold_skipped();
    }
}

/// Per-table outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table: Table,
    #[serde(flatten)]
    pub counters: TableCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriterSummary {
    pub tables: Vec<TableSummary>,
}

impl WriterSummary {
    pub fn table(&self, table: Table) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.table == table)
    }

    pub fn halted(&self) -> impl Iterator<Item = &TableSummary> {
        self.tables.iter().filter(|t| t.halted.is_some())
    }

    pub fn total_inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.counters.inserted).sum()
    }
}

pub struct BatchWriter<S: BatchSink> {
    sink: S,
    batch_size: usize,
    max_attempts: u32,
    tables: BTreeMap<Table, TableState>,
}

impl<S: BatchSink> BatchWriter<S> {
    pub fn new(sink: S, batch_size: usize) -> Self {
        Self {
            sink,
            batch_size: batch_size.max(1),
            max_attempts: DEFAULT_FLUSH_RETRIES + 1,
            tables: BTreeMap::new(),
        }
    }

    /// Set how many attempts one flush gets, the first included, before the
    /// table halts. At least one attempt is always made.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Buffer `record`, flushing its table if the buffer is full.
    ///
    /// Rows for a halted table are counted as dropped.
    pub fn push(&mut self, record: Record) {
        let table = record.table();
        let state = self.tables.entry(table).or_default();

        if state.halted.is_some() {
            state.counters.dropped += 1;
            return;
        }

        state.pending.push(record);
        if state.pending.len() >= self.batch_size {
            if let Err(err) = self.flush_table(table) {
                debug!(table = %table, error = %err, "Buffer discarded");
            }
        }
    }

    /// Count a skipped source line against `table`.
    ///
    /// Folded into the committed counters at the table's next flush.
    pub fn note_skipped(&mut self, table: Table) {
        self.tables.entry(table).or_default().pending_skipped += 1;
    }

    /// Flush the buffer for `table`, retrying on failure.
    ///
    /// Returns the number of rows committed, or `TableHalted` if the table
    /// is (or just became) halted.
    pub fn flush_table(&mut self, table: Table) -> Result<usize> {
        let state = self.tables.entry(table).or_default();

        if let Some(reason) = state.halted.clone() {
            state.drop_pending();
            return Err(IngestError::TableHalted {
                table: table.to_string(),
                reason,
            });
        }

        if state.pending.is_empty() {
            state.fold_skipped();
            return Ok(0);
        }

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match self.sink.insert_batch(table, &state.pending) {
                Ok(inserted) => {
                    state.pending.clear();
                    state.counters.inserted += inserted as u64;
                    state.counters.flushes += 1;
                    state.fold_skipped();
                    debug!(
                        table = %table,
                        rows = inserted,
                        total = state.counters.inserted,
                        "Batch committed"
                    );
                    return Ok(inserted);
                },
                Err(err) => {
                    warn!(
                        table = %table,
                        attempt,
                        max_attempts = self.max_attempts,
                        rows = state.pending.len(),
                        error = %err,
                        "Batch flush failed"
                    );
                    last_error = err.to_string();
                },
            }
        }

        error!(
            table = %table,
            rows = state.pending.len(),
            error = %last_error,
            "Halting table after repeated flush failures"
        );
        state.drop_pending();
        state.halted = Some(last_error.clone());

        Err(IngestError::TableHalted {
            table: table.to_string(),
            reason: last_error,
        })
    }

    /// Flush every table with buffered rows or skips.
    pub fn flush_all(&mut self) {
        let tables: Vec<Table> = self.tables.keys().copied().collect();
        for table in tables {
            if let Err(err) = self.flush_table(table) {
                debug!(table = %table, error = %err, "Flush skipped");
            }
        }
    }

    /// Flush everything and report per-table totals.
    pub fn finish(&mut self) -> WriterSummary {
        self.flush_all();
        self.summary()
    }

    /// Committed totals so far, without flushing.
    pub fn summary(&self) -> WriterSummary {
        WriterSummary {
            tables: self
                .tables
                .iter()
                .map(|(table, state)| TableSummary {
                    table: *table,
                    counters: state.counters,
                    halted: state.halted.clone(),
                })
                .collect(),
        }
    }

    pub fn counters(&self, table: Table) -> TableCounters {
        self.tables
            .get(&table)
            .map(|s| s.counters)
            .unwrap_or_default()
    }

    pub fn pending(&self, table: Table) -> usize {
        self.tables.get(&table).map_or(0, |s| s.pending.len())
    }

    /// Error that halted `table`, if any.
    pub fn halted(&self, table: Table) -> Option<&str> {
        self.tables.get(&table).and_then(|s| s.halted.as_deref())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
