//! Record-type contracts
//!
//! A contract is the static, versioned mapping from source field offsets to
//! destination columns for one record type. Contracts are built once into an
//! immutable [`ContractSet`] and passed explicitly to the dispatcher and
//! mapper.

use crate::error::{IngestError, Result};
use crate::record::fields_for;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use uls_common::{RecordType, Table};

/// Contract version of the built-in layouts.
pub const STANDARD_CONTRACT_VERSION: u32 = 1;

/// Body fields a line must carry to be mapped at all (`system_id`).
pub const DEFAULT_REQUIRED_FIELDS: usize = 1;

/// Semantic type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldType {
    Text,
    Real,
    Integer,
}

impl FieldType {
    /// SQLite column type.
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Real => "REAL",
            FieldType::Integer => "INTEGER",
        }
    }
}

/// One destination column and the source position it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub column: &'static str,
    pub ty: FieldType,
    /// Position counted after the marker field.
    pub offset: usize,
}

impl FieldSpec {
    pub const fn new(column: &'static str, ty: FieldType, offset: usize) -> Self {
        Self { column, ty, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub record_type: RecordType,
    pub table: Table,
    pub version: u32,
    pub fields: &'static [FieldSpec],
    /// Minimum number of body fields; shorter lines are skipped.
    pub required_fields: usize,
}

impl Contract {
    /// The built-in contract for `record_type`.
    pub fn standard(record_type: RecordType) -> Self {
        Self {
            record_type,
            table: record_type.table(),
            version: STANDARD_CONTRACT_VERSION,
            fields: fields_for(record_type),
            required_fields: DEFAULT_REQUIRED_FIELDS,
        }
    }

    pub fn marker(&self) -> &'static str {
        self.record_type.marker()
    }

    /// Highest offset read by this contract, plus one.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|f| f.offset + 1).max().unwrap_or(0)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.column)
    }

    /// Check the contract against the row struct it feeds.
    ///
    /// Columns and types must match the row layout in order, and no two
    /// columns may read the same offset.
    pub fn validate(&self) -> Result<()> {
        if self.table != self.record_type.table() {
            return Err(IngestError::invalid_contract(
                self.record_type,
                format!("routes to '{}' instead of '{}'", self.table, self.record_type.table()),
            ));
        }

        if self.required_fields == 0 || self.required_fields > self.width() {
            return Err(IngestError::invalid_contract(
                self.record_type,
                format!(
                    "required field count {} outside 1..={}",
                    self.required_fields,
                    self.width()
                ),
            ));
        }

        let layout = fields_for(self.record_type);
        if self.fields.len() != layout.len() {
            return Err(IngestError::invalid_contract(
                self.record_type,
                format!("{} fields declared, row has {}", self.fields.len(), layout.len()),
            ));
        }

        let mut offsets = HashSet::new();
        let mut columns = HashSet::new();
        for (field, expected) in self.fields.iter().zip(layout) {
            if field.column != expected.column || field.ty != expected.ty {
                return Err(IngestError::invalid_contract(
                    self.record_type,
                    format!(
                        "field '{}' ({:?}) does not match row column '{}' ({:?})",
                        field.column, field.ty, expected.column, expected.ty
                    ),
                ));
            }
            if !columns.insert(field.column) {
                return Err(IngestError::invalid_contract(
                    self.record_type,
                    format!("duplicate column '{}'", field.column),
                ));
            }
            if !offsets.insert(field.offset) {
                return Err(IngestError::invalid_contract(
                    self.record_type,
                    format!("duplicate offset {}", field.offset),
                ));
            }
        }

        Ok(())
    }
}

/// Immutable lookup from record type to contract.
#[derive(Debug, Clone)]
pub struct ContractSet {
    contracts: BTreeMap<RecordType, Contract>,
}

impl ContractSet {
    /// The six built-in contracts.
    pub fn standard() -> Self {
        Self {
            contracts: RecordType::ALL
                .into_iter()
                .map(|rt| (rt, Contract::standard(rt)))
                .collect(),
        }
    }

    /// Build a set from explicit contracts, validating each one.
    pub fn new(contracts: Vec<Contract>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for contract in contracts {
            contract.validate()?;
            let record_type = contract.record_type;
            if map.insert(record_type, contract).is_some() {
                return Err(IngestError::invalid_contract(
                    record_type,
                    "registered more than once",
                ));
            }
        }
        Ok(Self { contracts: map })
    }

    /// Validate every contract in the set.
    pub fn validate(&self) -> Result<()> {
        self.contracts.values().try_for_each(Contract::validate)
    }

    pub fn get(&self, record_type: RecordType) -> Result<&Contract> {
        self.contracts
            .get(&record_type)
            .ok_or_else(|| IngestError::MissingContract(record_type.to_string()))
    }

    pub fn contains(&self, record_type: RecordType) -> bool {
        self.contracts.contains_key(&record_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }
}

impl Default for ContractSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    static SWAPPED: [FieldSpec; 7] = [
        FieldSpec::new("system_id", FieldType::Text, 0),
        FieldSpec::new("uls_file_number", FieldType::Text, 1),
        FieldSpec::new("ebf_number", FieldType::Text, 2),
        FieldSpec::new("call_sign", FieldType::Text, 3),
        FieldSpec::new("purpose_code", FieldType::Text, 4),
        FieldSpec::new("status_code", FieldType::Text, 4),
        FieldSpec::new("status_date", FieldType::Text, 6),
    ];

    static RETYPED: [FieldSpec; 7] = [
        FieldSpec::new("system_id", FieldType::Integer, 0),
        FieldSpec::new("uls_file_number", FieldType::Text, 1),
        FieldSpec::new("ebf_number", FieldType::Text, 2),
        FieldSpec::new("call_sign", FieldType::Text, 3),
        FieldSpec::new("purpose_code", FieldType::Text, 4),
        FieldSpec::new("status_code", FieldType::Text, 5),
        FieldSpec::new("status_date", FieldType::Text, 6),
    ];

    #[test]
    fn test_standard_set_is_valid() {
        let set = ContractSet::standard();
        set.validate().unwrap();
        assert_eq!(set.iter().count(), 6);

        for rt in RecordType::ALL {
            let contract = set.get(rt).unwrap();
            assert_eq!(contract.marker(), rt.marker());
            assert_eq!(contract.width(), contract.fields.len());
            assert_eq!(contract.version, STANDARD_CONTRACT_VERSION);
        }
    }

    #[test]
    fn test_duplicate_offset_rejected() {
        let contract = Contract {
            fields: &SWAPPED,
            ..Contract::standard(RecordType::ApplicationPurpose)
        };
        let err = contract.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate offset 4"), "{err}");
    }

    #[test]
    fn test_type_drift_rejected() {
        let contract = Contract {
            fields: &RETYPED,
            ..Contract::standard(RecordType::ApplicationPurpose)
        };
        assert!(contract.validate().is_err());
    }

    #[test]
    fn test_wrong_table_rejected() {
        let contract = Contract {
            table: Table::Licenses,
            ..Contract::standard(RecordType::Entity)
        };
        assert!(contract.validate().is_err());
    }

    #[test]
    fn test_partial_set_and_duplicates() {
        let set = ContractSet::new(vec![Contract::standard(RecordType::License)]).unwrap();
        assert!(set.contains(RecordType::License));
        assert!(matches!(
            set.get(RecordType::Antenna),
            Err(IngestError::MissingContract(_))
        ));

        let dup = ContractSet::new(vec![
            Contract::standard(RecordType::License),
            Contract::standard(RecordType::License),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn test_required_fields_bounds() {
        let contract = Contract {
            required_fields: 0,
            ..Contract::standard(RecordType::License)
        };
        assert!(contract.validate().is_err());
    }
}
