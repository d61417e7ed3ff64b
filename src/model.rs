//! Table-group data model (spec §3): `TableGroup`, `Table`, `TableSchema`,
//! `ForeignKeyDefinition`, `ReferencedForeignKey`.
//!
//! Generalises the teacher's single-table `schema.rs::Schema` into a
//! multi-table group with foreign-key graph edges between tables.

use crate::column::Column;
use crate::dialect::Dialect;

/// The child-side foreign key declaration: `local_columns → (resource,
/// referenced_columns)` (spec §3, GLOSSARY).
#[derive(Debug, Clone)]
pub struct ForeignKeyDefinition {
    /// 0-based indices into the owning table's `TableSchema::columns`.
    pub local_columns: Vec<usize>,
    pub resource_url: String,
    pub referenced_columns: Vec<String>,
}

/// The parent-side mirror attached to the target table (spec §3, GLOSSARY).
/// Equality is by `(source_table_url, local_columns, target_columns)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedForeignKey {
    pub source_table_url: String,
    /// Column names on the source table, kept for display/debugging.
    pub source_local_columns: Vec<String>,
    /// 0-based indices into this (target) table's `TableSchema::columns`.
    pub target_columns: Vec<usize>,
}

/// Ordered list of columns, foreign key definitions, and the primary key
/// (spec §3 TableSchema).
#[derive(Debug, Default)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    /// 0-based indices into `columns`; possibly empty.
    pub primary_key: Vec<usize>,
}

impl TableSchema {
    pub fn column_index_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
    }

    pub fn is_list_valued(&self, index: usize) -> bool {
        self.columns
            .get(index)
            .map(|c| c.separator.is_some())
            .unwrap_or(false)
    }
}

/// A single CSV file plus its schema (spec §3 Table). Equality and hash are
/// by `url`.
#[derive(Debug)]
pub struct Table {
    pub url: String,
    pub suppress_output: bool,
    pub id: Option<String>,
    pub schema: Option<TableSchema>,
    pub dialect: Option<Dialect>,
    pub notes: Vec<String>,
    pub referenced_foreign_keys: Vec<ReferencedForeignKey>,
    /// Non-fatal metadata problems found while building this table's schema
    /// (spec §7: "metadata errors fail the affected table immediately but do
    /// not abort sibling tables"). Surfaced as `metadata`-category report
    /// entries; does not prevent row validation from running.
    pub metadata_errors: Vec<String>,
}

impl Table {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            suppress_output: false,
            id: None,
            schema: None,
            dialect: None,
            notes: Vec::new(),
            referenced_foreign_keys: Vec::new(),
            metadata_errors: Vec::new(),
        }
    }

    pub fn effective_dialect(&self, group_dialect: &Dialect) -> Dialect {
        self.dialect.clone().unwrap_or_else(|| group_dialect.clone())
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}
impl Eq for Table {}
impl std::hash::Hash for Table {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// An ordered collection of `Table`s sharing a dialect (spec §3 TableGroup).
#[derive(Debug, Default)]
pub struct TableGroup {
    pub tables: Vec<Table>,
    pub dialect: Dialect,
}

impl TableGroup {
    pub fn table_index_by_url(&self, url: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.url == url)
    }

    /// Resolves `ReferencedForeignKey`s on every table from the
    /// `ForeignKeyDefinition`s declared across the group (spec §3 "referenced
    /// foreign keys are resolved after all tables are loaded").
    pub fn resolve_referenced_foreign_keys(&mut self) {
        let mut edges: Vec<(usize, ReferencedForeignKey)> = Vec::new();
        for source in &self.tables {
            let Some(schema) = &source.schema else {
                continue;
            };
            for fk in &schema.foreign_keys {
                let Some(target_idx) = self.table_index_by_url(&fk.resource_url) else {
                    continue;
                };
                let Some(target_schema) = &self.tables[target_idx].schema else {
                    continue;
                };
                let target_columns: Vec<usize> = fk
                    .referenced_columns
                    .iter()
                    .filter_map(|name| target_schema.column_index_by_name(name))
                    .collect();
                if target_columns.len() != fk.referenced_columns.len() {
                    continue;
                }
                let source_local_columns = fk
                    .local_columns
                    .iter()
                    .filter_map(|&idx| schema.columns.get(idx).and_then(|c| c.name.clone()))
                    .collect();
                edges.push((
                    target_idx,
                    ReferencedForeignKey {
                        source_table_url: source.url.clone(),
                        source_local_columns,
                        target_columns,
                    },
                ));
            }
        }
        for (target_idx, rfk) in edges {
            self.tables[target_idx].referenced_foreign_keys.push(rfk);
        }
    }
}
