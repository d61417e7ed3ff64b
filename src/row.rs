//! Row validation (spec §4.3): applies every column validator across one CSV
//! record and assembles primary-key / foreign-key tuples.
//!
//! Grounded on the teacher's `rows.rs::parse_typed_row`, which maps a raw
//! string row onto typed values column-by-column; this module generalises
//! that single pass into the full `RowOutcome` the pipeline needs (errors,
//! primary key, child/parent foreign key tuples).

use crate::datatypes::value::Value;
use crate::error::ReportEntry;
use crate::model::TableSchema;

/// One component of a `KeyValue`: the concatenated string forms of a single
/// column's parsed values (spec §4.3 "flattens list columns; concatenation
/// uses the empty string as the join").
pub type KeyComponent = String;

/// An ordered tuple of per-column components used to identify a row for
/// primary-key uniqueness or foreign-key lookup (GLOSSARY). Equality and
/// hashing use the canonical (decimal-normalised / UTC-instant) component
/// strings; `display` keeps the original textual form for error messages
/// (spec.md §8 S4).
#[derive(Debug, Clone)]
pub struct KeyValue {
    pub canonical: Vec<KeyComponent>,
    pub display: Vec<KeyComponent>,
}

impl KeyValue {
    pub fn is_empty_reference(&self) -> bool {
        self.canonical.iter().all(|c| c.is_empty())
    }

    pub fn joined_display(&self) -> String {
        self.display.join(", ")
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}
impl Eq for KeyValue {}
impl std::hash::Hash for KeyValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

/// A `KeyValue` bundled with the row it came from and a duplicate flag.
/// Equality and hashing ignore `record_number` and `is_duplicate`, matching
/// the source's set semantics (spec §9 "mutable duplicate flag on key
/// values" — modelled here as a plain field rather than interior
/// mutability, since the accumulator owns and replaces entries directly).
#[derive(Debug, Clone)]
pub struct KeyValueWithContext {
    pub key: KeyValue,
    pub record_number: usize,
    pub is_duplicate: bool,
}

impl PartialEq for KeyValueWithContext {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for KeyValueWithContext {}
impl std::hash::Hash for KeyValueWithContext {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// The outcome of validating one CSV record against a table's schema
/// (spec §4.3).
#[derive(Debug)]
pub struct RowOutcome {
    pub record_number: usize,
    pub errors: Vec<ReportEntry>,
    pub primary_key: Option<KeyValue>,
    /// `(foreign_key_index, key_value)` for each `ForeignKeyDefinition`.
    pub child_foreign_keys: Vec<(usize, KeyValue)>,
    /// `(referenced_foreign_key_index, key_value)` for each
    /// `ReferencedForeignKey` pointing at this table.
    pub parent_foreign_key_references: Vec<(usize, KeyValue)>,
}

fn build_key_value(parsed: &[Vec<Value>], indices: &[usize]) -> KeyValue {
    let mut canonical = Vec::with_capacity(indices.len());
    let mut display = Vec::with_capacity(indices.len());
    for &idx in indices {
        let items = parsed.get(idx).map(Vec::as_slice).unwrap_or(&[]);
        canonical.push(items.iter().map(Value::canonical_key).collect::<String>());
        display.push(items.iter().map(Value::display_string).collect::<String>());
    }
    KeyValue { canonical, display }
}

/// Validates one CSV record against `schema` (spec §4.3). `fields` is the
/// decoded record; `record_number` is the 1-based number the CSV parser
/// reports.
pub fn validate_row(schema: &TableSchema, fields: &[String], record_number: usize) -> RowOutcome {
    let mut errors = Vec::new();
    let mut parsed_per_column: Vec<Vec<Value>> = Vec::with_capacity(schema.columns.len());

    for (idx, column) in schema.columns.iter().enumerate() {
        let cell = fields.get(idx).map(String::as_str).unwrap_or("");
        let (mut cell_errors, values) = column.validate(cell, record_number);
        errors.append(&mut cell_errors);
        parsed_per_column.push(values);
    }

    let primary_key = if schema.primary_key.is_empty() {
        None
    } else {
        Some(build_key_value(&parsed_per_column, &schema.primary_key))
    };

    let child_foreign_keys = schema
        .foreign_keys
        .iter()
        .enumerate()
        .map(|(idx, fk)| (idx, build_key_value(&parsed_per_column, &fk.local_columns)))
        .collect();

    RowOutcome {
        record_number,
        errors,
        primary_key,
        child_foreign_keys,
        parent_foreign_key_references: Vec::new(),
    }
}

/// Extracts only the parent-key tuples for this row (used by the caller once
/// a table's `ReferencedForeignKey`s are known — kept separate from
/// `validate_row` so the pipeline can call it without re-running column
/// validation when only key extraction is needed, spec §4.4 pass 2).
pub fn extract_referenced_foreign_keys(
    schema: &TableSchema,
    referenced: &[crate::model::ReferencedForeignKey],
    fields: &[String],
) -> Vec<KeyValue> {
    let parsed_per_column: Vec<Vec<Value>> = schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let cell = fields.get(idx).map(String::as_str).unwrap_or("");
            column.validate(cell, 0).1
        })
        .collect();
    referenced
        .iter()
        .map(|rfk| build_key_value(&parsed_per_column, &rfk.target_columns))
        .collect()
}
