//! Field mapping and coercion
//!
//! Turns one delimited line into a typed row using a contract. This is the
//! only place contract offsets are applied, and they are applied to the
//! fields that follow the record-type marker. Reading them from the start
//! of the line shifts every column by one, which historically put a power
//! value where the assigned frequency belongs.
//!
//! Coercion never fails a line:
//!
//! - `Real`: trimmed decimal text, `NULL` when empty, non-numeric or not finite
//! - `Integer`: trimmed integer text (a zero-fraction decimal such as `3.0`
//!   is accepted), otherwise `NULL`
//! - `Text`: trailing whitespace removed, `NULL` when nothing is left
//!
//! Positions past the end of a short line are `NULL`.

use crate::contract::{Contract, FieldType};
use crate::dispatch::SkipReason;
use crate::record::{Record, Value};
use uls_common::RecordType;

/// Per-line result.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Parsed(Record),
    Skipped(SkipReason),
}

impl LineOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, LineOutcome::Parsed(_))
    }
}

/// Coerced values of one line, in contract order.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub record_type: RecordType,
    pub columns: Vec<(&'static str, Value)>,
}

impl MappedRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn into_record(self) -> Record {
        let values = self.columns.into_iter().map(|(_, value)| value).collect();
        Record::from_values(self.record_type, values)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Mapper {
    delimiter: char,
}

impl Mapper {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Split `line`, drop the marker field and coerce each contract field.
    pub fn map_line(&self, line: &str, contract: &Contract) -> Result<MappedRow, SkipReason> {
        let body: Vec<&str> = line.split(self.delimiter).skip(1).collect();

        if body.len() < contract.required_fields {
            return Err(SkipReason::TooShort {
                fields: body.len(),
                required: contract.required_fields,
            });
        }

        let columns = contract
            .fields
            .iter()
            .map(|spec| (spec.column, coerce(spec.ty, body.get(spec.offset).copied())))
            .collect();

        Ok(MappedRow {
            record_type: contract.record_type,
            columns,
        })
    }

    /// Map `line` straight into a typed row.
    pub fn map_record(&self, line: &str, contract: &Contract) -> LineOutcome {
        match self.map_line(line, contract) {
            Ok(row) => LineOutcome::Parsed(row.into_record()),
            Err(reason) => LineOutcome::Skipped(reason),
        }
    }
}

/// Coerce a raw field according to its declared type.
pub fn coerce(ty: FieldType, raw: Option<&str>) -> Value {
    match ty {
        FieldType::Text => coerce_text(raw),
        FieldType::Real => coerce_real(raw),
        FieldType::Integer => coerce_integer(raw),
    }
}

pub fn coerce_text(raw: Option<&str>) -> Value {
    match raw.map(str::trim_end) {
        Some(s) if !s.is_empty() => Value::Text(s.to_string()),
        _ => Value::Null,
    }
}

pub fn coerce_real(raw: Option<&str>) -> Value {
    raw.and_then(parse_finite)
        .map(Value::Real)
        .unwrap_or(Value::Null)
}

pub fn coerce_integer(raw: Option<&str>) -> Value {
    let Some(raw) = raw.map(str::trim) else {
        return Value::Null;
    };

    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }

    // Some extracts write counts as "3.0".
    match parse_finite(raw) {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Value::Integer(f as i64)
        },
        _ => Value::Null,
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}
