//! Typed rows for the six record types
//!
//! Every row struct, its column list and its source offsets come from one
//! declaration in [`layouts`]. The contract a line is mapped with and the
//! struct it lands in therefore cannot drift apart, and a misspelt column
//! is a compile error rather than a silently empty field.

use serde::{Deserialize, Serialize};

/// A coerced field value, prior to being placed in a typed row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Real(f64),
    Integer(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s),
            Value::Real(f) => Some(f.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Null => None,
        }
    }

    pub fn into_real(self) -> Option<f64> {
        self.as_real()
    }

    pub fn into_integer(self) -> Option<i64> {
        self.as_integer()
    }
}

macro_rules! field_type {
    (Text) => { Option<String> };
    (Real) => { Option<f64> };
    (Integer) => { Option<i64> };
}

macro_rules! take_value {
    (Text, $value:expr) => { $value.into_text() };
    (Real, $value:expr) => { $value.into_real() };
    (Integer, $value:expr) => { $value.into_integer() };
}

/// Declares the row structs, the [`Record`] enum and [`fields_for`].
///
/// Each entry is `Variant(RowStruct) { offset => column: Type, ... }` where
/// `Variant` matches the `RecordType` variant and offsets count from the
/// first field after the marker.
macro_rules! record_layouts {
    ($(
        $(#[$meta:meta])*
        $variant:ident($row:ident) {
            $($offset:literal => $col:ident : $ty:ident),+ $(,)?
        }
    )+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
            pub struct $row {
                $(pub $col: field_type!($ty),)+
            }

            impl $row {
                pub const RECORD_TYPE: ::uls_common::RecordType = ::uls_common::RecordType::$variant;

                pub const FIELDS: &'static [$crate::contract::FieldSpec] = &[
                    $($crate::contract::FieldSpec::new(
                        stringify!($col),
                        $crate::contract::FieldType::$ty,
                        $offset,
                    ),)+
                ];

                /// Build a row from values in `FIELDS` order. Missing values are null.
                pub fn from_values(values: Vec<$crate::record::Value>) -> Self {
                    let mut values = values.into_iter();
                    Self {
                        $($col: take_value!(
                            $ty,
                            values.next().unwrap_or($crate::record::Value::Null)
                        ),)+
                    }
                }

                /// Insert parameters in `FIELDS` order.
                pub fn bind_params(&self) -> Vec<&dyn ::rusqlite::types::ToSql> {
                    vec![$(&self.$col as &dyn ::rusqlite::types::ToSql,)+]
                }

                /// Read a row back by column name.
                pub fn from_sql_row(row: &::rusqlite::Row<'_>) -> ::rusqlite::Result<Self> {
                    Ok(Self {
                        $($col: row.get(stringify!($col))?,)+
                    })
                }

                /// Number of non-null fields.
                pub fn populated_fields(&self) -> usize {
                    [$(self.$col.is_some(),)+].into_iter().filter(|set| *set).count()
                }
            }
        )+

        /// One parsed line, tagged by record type.
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(tag = "record_type", content = "row")]
        pub enum Record {
            $($variant($row),)+
        }

        impl Record {
            pub fn record_type(&self) -> ::uls_common::RecordType {
                match self {
                    $(Record::$variant(_) => ::uls_common::RecordType::$variant,)+
                }
            }

            pub fn table(&self) -> ::uls_common::Table {
                self.record_type().table()
            }

            /// Build the typed row for `record_type` from values in contract order.
            pub fn from_values(
                record_type: ::uls_common::RecordType,
                values: Vec<$crate::record::Value>,
            ) -> Self {
                match record_type {
                    $(::uls_common::RecordType::$variant => Record::$variant($row::from_values(values)),)+
                }
            }

            pub fn bind_params(&self) -> Vec<&dyn ::rusqlite::types::ToSql> {
                match self {
                    $(Record::$variant(row) => row.bind_params(),)+
                }
            }

            pub fn populated_fields(&self) -> usize {
                match self {
                    $(Record::$variant(row) => row.populated_fields(),)+
                }
            }
        }

        /// Column layout of the row struct for `record_type`.
        pub fn fields_for(record_type: ::uls_common::RecordType) -> &'static [$crate::contract::FieldSpec] {
            match record_type {
                $(::uls_common::RecordType::$variant => $row::FIELDS,)+
            }
        }
    };
}

mod layouts;

pub use layouts::{
    fields_for, AntennaRow, ApplicationPurposeRow, EntityRow, FrequencyRow, LicenseRow,
    LocationRow, Record,
};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::contract::FieldType;
    use std::collections::HashSet;
    use uls_common::RecordType;

    #[test]
    fn test_field_counts_match_published_layouts() {
        let expected = [
            (RecordType::License, 58),
            (RecordType::Entity, 29),
            (RecordType::Frequency, 29),
            (RecordType::Location, 50),
            (RecordType::Antenna, 37),
            (RecordType::ApplicationPurpose, 7),
        ];

        for (rt, count) in expected {
            assert_eq!(fields_for(rt).len(), count, "field count for {rt}");
        }
    }

    #[test]
    fn test_layouts_start_with_shared_keys() {
        for rt in RecordType::ALL {
            let fields = fields_for(rt);
            let leading: Vec<_> = fields.iter().take(4).map(|f| (f.column, f.offset)).collect();
            assert_eq!(
                leading,
                vec![("system_id", 0), ("uls_file_number", 1), ("ebf_number", 2), ("call_sign", 3)],
                "{rt}"
            );
        }
    }

    #[test]
    fn test_offsets_are_dense_and_unique() {
        for rt in RecordType::ALL {
            let fields = fields_for(rt);
            let offsets: HashSet<_> = fields.iter().map(|f| f.offset).collect();
            assert_eq!(offsets.len(), fields.len(), "{rt}");
            assert!(fields.iter().enumerate().all(|(i, f)| f.offset == i), "{rt}");
        }
    }

    #[test]
    fn test_frequency_numeric_columns() {
        let fields = fields_for(RecordType::Frequency);
        let assigned = fields.iter().find(|f| f.column == "frequency_assigned").unwrap();
        assert_eq!((assigned.offset, assigned.ty), (9, FieldType::Real));

        let power = fields.iter().find(|f| f.column == "power_output").unwrap();
        assert_eq!((power.offset, power.ty), (14, FieldType::Real));

        let location = fields.iter().find(|f| f.column == "location_number").unwrap();
        assert_eq!(location.ty, FieldType::Integer);
    }

    #[test]
    fn test_from_values_fills_missing_with_null() {
        let row = ApplicationPurposeRow::from_values(vec![
            Value::Text("123".into()),
            Value::Null,
            Value::Null,
            Value::Text("W1AW".into()),
        ]);

        assert_eq!(row.system_id.as_deref(), Some("123"));
        assert_eq!(row.call_sign.as_deref(), Some("W1AW"));
        assert_eq!(row.purpose_code, None);
        assert_eq!(row.status_date, None);
        assert_eq!(row.populated_fields(), 2);
    }

    #[test]
    fn test_record_dispatches_to_row() {
        let record = Record::from_values(RecordType::Frequency, vec![Value::Text("9".into())]);
        assert_eq!(record.record_type(), RecordType::Frequency);
        assert_eq!(record.table().as_str(), "frequencies");
        assert_eq!(record.bind_params().len(), 29);
        assert!(matches!(record, Record::Frequency(ref row) if row.system_id.as_deref() == Some("9")));
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Integer(4).into_real(), Some(4.0));
        assert_eq!(Value::Real(1.5).into_integer(), None);
        assert_eq!(Value::Text("x".into()).into_real(), None);
        assert_eq!(Value::Null.into_text(), None);
        assert!(Value::Null.is_null());
    }
}
