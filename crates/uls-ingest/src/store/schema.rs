//! SQLite schema for the ULS store
//!
//! Table definitions are derived from the record layouts. Data tables are
//! append-only and carry no UNIQUE constraints; `system_id` and `call_sign`
//! get plain lookup indexes.

use crate::contract::FieldSpec;
use crate::error::Result;
use crate::record::fields_for;
use rusqlite::Connection;
use uls_common::types::AUDIT_TABLE;
use uls_common::Table;

/// Columns indexed on every data table.
pub const INDEXED_COLUMNS: [&str; 2] = ["call_sign", "system_id"];

/// Upper bound on bound parameters per INSERT statement.
///
/// Bundled SQLite allows 32766; staying below leaves headroom.
pub const MAX_BIND_PARAMS: usize = 30_000;

/// `CREATE TABLE` statement for a data table.
pub fn create_table_sql(table: Table) -> String {
    let columns = fields_for(table.record_type())
        .iter()
        .map(|f| format!("    {} {}", f.column, f.ty.sql_type()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n{},\n    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP\n)",
        table.as_str(),
        columns
    )
}

fn create_audit_table_sql() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {AUDIT_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_type TEXT NOT NULL,
            file_size INTEGER NOT NULL,
            records_processed INTEGER NOT NULL,
            records_skipped INTEGER NOT NULL,
            success INTEGER NOT NULL,
            error_message TEXT,
            ingested_at TEXT NOT NULL
        )
        "#
    )
}

/// Create all tables and indexes. Safe to run repeatedly.
pub fn init_schema(conn: &Connection) -> Result<()> {
    for table in Table::ALL {
        conn.execute(&create_table_sql(table), [])?;

        for column in INDEXED_COLUMNS {
            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column})",
                    table = table.as_str()
                ),
                [],
            )?;
        }
    }

    conn.execute(&create_audit_table_sql(), [])?;
    conn.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{AUDIT_TABLE}_run_id ON {AUDIT_TABLE}(run_id)"),
        [],
    )?;

    Ok(())
}

/// Rows that fit in one INSERT for a table with `columns` columns.
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Multi-row `INSERT` for `rows` rows of `fields`.
pub fn insert_sql(table: Table, fields: &[FieldSpec], rows: usize) -> String {
    let columns = fields.iter().map(|f| f.column).collect::<Vec<_>>().join(", ");
    let placeholders = format!("({})", vec!["?"; fields.len()].join(", "));
    let values = vec![placeholders.as_str(); rows].join(", ");

    format!("INSERT INTO {} ({}) VALUES {}", table.as_str(), columns, values)
}
