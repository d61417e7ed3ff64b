//! Table Pipeline (spec §4.4): streams one table's CSV file through the row
//! validator with bounded parallelism and accumulates per-table state.
//!
//! Grounded on `process.rs`'s CSV-reader-driven row loop (sequential read,
//! `io_utils::decode_record`, per-row typed parsing) extended with
//! `rayon`-backed batch parallelism per spec §5: a single sequential reader
//! feeds fixed-size batches to a bounded thread pool, and results fold back
//! into the accumulator single-threaded so no shared mutable state needs
//! locking.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;

use crate::byte_source::ByteSource;
use crate::dialect::Dialect;
use crate::error::{FetchError, ReportEntry, categories, kinds};
use crate::io_utils;
use crate::model::{ReferencedForeignKey, Table, TableSchema};
use crate::row::{self, KeyValue, KeyValueWithContext, RowOutcome};

/// Per-table validation state accumulated across pass 1 (spec §4.4).
#[derive(Debug, Default)]
pub struct TableAccumulator {
    pub errors: Vec<ReportEntry>,
    pub warnings: Vec<ReportEntry>,
    pub rows_processed: usize,
    /// One set per `ForeignKeyDefinition` on this table's schema.
    pub child_foreign_keys: Vec<HashSet<KeyValueWithContext>>,
    /// One set per `ReferencedForeignKey` pointing at this table.
    pub parent_foreign_key_references: Vec<HashSet<KeyValueWithContext>>,
    pk_hash_buckets: HashMap<u64, Vec<usize>>,
}

impl TableAccumulator {
    fn new(foreign_key_count: usize, referenced_count: usize) -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            rows_processed: 0,
            child_foreign_keys: (0..foreign_key_count).map(|_| HashSet::new()).collect(),
            parent_foreign_key_references: (0..referenced_count).map(|_| HashSet::new()).collect(),
            pk_hash_buckets: HashMap::new(),
        }
    }

    fn record_outcome(&mut self, outcome: RowOutcome) {
        self.rows_processed += 1;
        self.errors.extend(outcome.errors);

        for (fk_idx, key) in outcome.child_foreign_keys {
            if let Some(set) = self.child_foreign_keys.get_mut(fk_idx) {
                set.insert(KeyValueWithContext {
                    key,
                    record_number: outcome.record_number,
                    is_duplicate: false,
                });
            }
        }

        for (rfk_idx, key) in outcome.parent_foreign_key_references {
            if let Some(set) = self.parent_foreign_key_references.get_mut(rfk_idx) {
                let candidate = KeyValueWithContext {
                    key,
                    record_number: outcome.record_number,
                    is_duplicate: false,
                };
                if set.contains(&candidate) {
                    let mut duplicate = candidate;
                    duplicate.is_duplicate = true;
                    set.replace(duplicate);
                } else {
                    set.insert(candidate);
                }
            }
        }

        if let Some(pk) = outcome.primary_key {
            let hash = hash_key_value(&pk);
            self.pk_hash_buckets.entry(hash).or_default().push(outcome.record_number);
        }
    }
}

fn hash_key_value(key: &KeyValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

fn fetch_error_kind(err: &FetchError) -> &'static str {
    match err {
        FetchError::NotFound(_) => kinds::FILE_NOT_FOUND,
        _ => kinds::CSV_CANNOT_BE_DOWNLOADED,
    }
}

/// Runs both passes of the table pipeline for `table` (spec §4.4) and
/// returns the accumulated state. A fatal I/O error on the CSV source
/// yields a single error entry and an otherwise-empty accumulator (spec §5
/// "Cancellation").
pub fn run_table(
    table: &Table,
    group_dialect: &Dialect,
    byte_source: &dyn ByteSource,
    row_grouping: usize,
    parallelism: usize,
) -> Result<TableAccumulator> {
    let empty_schema = TableSchema::default();
    let schema = table.schema.as_ref().unwrap_or(&empty_schema);
    let mut accumulator = TableAccumulator::new(
        schema.foreign_keys.len(),
        table.referenced_foreign_keys.len(),
    );

    if table.schema.is_none() {
        return Ok(accumulator);
    }

    let dialect = table.effective_dialect(group_dialect);

    let path = match byte_source.fetch(&table.url) {
        Ok(path) => path,
        Err(err) => {
            accumulator.errors.push(
                ReportEntry::new(
                    fetch_error_kind(&err),
                    categories::STRUCTURE,
                    String::new(),
                    String::new(),
                    err.to_string(),
                )
                .with_csv_path(table.url.clone()),
            );
            return Ok(accumulator);
        }
    };

    info!(
        "Validating table '{}' ({} columns)",
        table.url,
        schema.columns.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1))
        .build()
        .context("Building row-validation thread pool")?;

    run_pass_one(
        &path,
        &dialect,
        schema,
        &table.referenced_foreign_keys,
        row_grouping,
        &pool,
        &mut accumulator,
    )?;
    run_pass_two(&path, &dialect, schema, &mut accumulator)?;

    debug!(
        "Table '{}' finished: {} rows, {} errors, {} warnings",
        table.url,
        accumulator.rows_processed,
        accumulator.errors.len(),
        accumulator.warnings.len()
    );

    Ok(accumulator)
}

fn validate_header_row(schema: &TableSchema, fields: &[String], accumulator: &mut TableAccumulator) {
    if fields.len() != schema.columns.len() {
        accumulator.errors.push(ReportEntry::new(
            kinds::MALFORMED_HEADER,
            categories::STRUCTURE,
            "1",
            String::new(),
            format!(
                "expected {} column(s), found {}",
                schema.columns.len(),
                fields.len()
            ),
        ));
    }

    let mut seen: HashMap<String, ()> = HashMap::new();
    for (idx, column) in schema.columns.iter().enumerate() {
        let observed = fields.get(idx).map(String::as_str).unwrap_or("");
        let ordinal = column.ordinal.to_string();

        if observed.is_empty() {
            accumulator.warnings.push(ReportEntry::new(
                kinds::EMPTY_COLUMN_NAME,
                categories::STRUCTURE,
                "1",
                ordinal.clone(),
                String::new(),
            ));
        } else if seen.insert(observed.to_string(), ()).is_some() {
            accumulator.warnings.push(ReportEntry::new(
                kinds::DUPLICATE_COLUMN_NAME,
                categories::STRUCTURE,
                "1",
                ordinal.clone(),
                observed.to_string(),
            ));
        }

        if let Some(error) = column.validate_header(observed) {
            accumulator.errors.push(error);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_pass_one(
    path: &Path,
    dialect: &Dialect,
    schema: &TableSchema,
    referenced: &[ReferencedForeignKey],
    row_grouping: usize,
    pool: &rayon::ThreadPool,
    accumulator: &mut TableAccumulator,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Opening CSV file {path:?}"))?;
    let mut reader = dialect.build_reader(BufReader::new(file));

    let mut record_number = 0usize;
    let mut header_seen = false;
    let mut skip_remaining = dialect.skip_rows;
    let mut batch: Vec<(usize, Vec<String>)> = Vec::with_capacity(row_grouping.max(1));
    let mut raw = csv::ByteRecord::new();

    while reader.read_byte_record(&mut raw).context("Reading CSV record")? {
        if skip_remaining > 0 {
            skip_remaining -= 1;
            continue;
        }
        record_number += 1;
        let fields = io_utils::decode_record(&raw, dialect.encoding)
            .with_context(|| format!("Decoding CSV record {record_number}"))?;

        if !header_seen {
            header_seen = true;
            if dialect.header {
                validate_header_row(schema, &fields, accumulator);
                continue;
            }
        }

        if dialect.skip_blank_rows && dialect.is_blank_record(&fields) {
            accumulator.warnings.push(ReportEntry::new(
                kinds::BLANK_ROWS,
                categories::STRUCTURE,
                record_number.to_string(),
                String::new(),
                String::new(),
            ));
            continue;
        }

        if fields.len() != schema.columns.len() {
            accumulator.errors.push(ReportEntry::new(
                kinds::RAGGED_ROWS,
                categories::STRUCTURE,
                record_number.to_string(),
                String::new(),
                format!(
                    "expected {} columns, found {}",
                    schema.columns.len(),
                    fields.len()
                ),
            ));
            continue;
        }

        batch.push((record_number, fields));
        if batch.len() >= row_grouping.max(1) {
            flush_batch(&mut batch, schema, referenced, pool, accumulator);
        }
    }

    if !batch.is_empty() {
        flush_batch(&mut batch, schema, referenced, pool, accumulator);
    }

    Ok(())
}

fn flush_batch(
    batch: &mut Vec<(usize, Vec<String>)>,
    schema: &TableSchema,
    referenced: &[ReferencedForeignKey],
    pool: &rayon::ThreadPool,
    accumulator: &mut TableAccumulator,
) {
    let outcomes: Vec<RowOutcome> = pool.install(|| {
        batch
            .par_iter()
            .map(|(record_number, fields)| {
                let mut outcome = row::validate_row(schema, fields, *record_number);
                outcome.parent_foreign_key_references =
                    row::extract_referenced_foreign_keys(schema, referenced, fields)
                        .into_iter()
                        .enumerate()
                        .collect();
                outcome
            })
            .collect()
    });
    for outcome in outcomes {
        accumulator.record_outcome(outcome);
    }
    batch.clear();
}

/// Re-reads only the rows whose primary-key hash collided in pass 1 and
/// resolves true duplicates (spec §4.4 pass 2, §9 "hash-then-verify").
fn run_pass_two(
    path: &Path,
    dialect: &Dialect,
    schema: &TableSchema,
    accumulator: &mut TableAccumulator,
) -> Result<()> {
    if schema.primary_key.is_empty() {
        return Ok(());
    }

    let colliding: HashSet<usize> = accumulator
        .pk_hash_buckets
        .values()
        .filter(|rows| rows.len() >= 2)
        .flatten()
        .copied()
        .collect();
    if colliding.is_empty() {
        return Ok(());
    }

    let file = File::open(path).with_context(|| format!("Opening CSV file {path:?}"))?;
    let mut reader = dialect.build_reader(BufReader::new(file));

    let mut record_number = 0usize;
    let mut header_seen = false;
    let mut skip_remaining = dialect.skip_rows;
    let mut raw = csv::ByteRecord::new();
    let mut seen_keys: HashSet<KeyValue> = HashSet::new();

    while reader.read_byte_record(&mut raw).context("Reading CSV record")? {
        if skip_remaining > 0 {
            skip_remaining -= 1;
            continue;
        }
        record_number += 1;

        if !header_seen {
            header_seen = true;
            if dialect.header {
                continue;
            }
        }

        if !colliding.contains(&record_number) {
            continue;
        }

        let fields = io_utils::decode_record(&raw, dialect.encoding)
            .with_context(|| format!("Decoding CSV record {record_number}"))?;
        if fields.len() != schema.columns.len() {
            continue;
        }

        let outcome = row::validate_row(schema, &fields, record_number);
        let Some(key) = outcome.primary_key else {
            continue;
        };
        if key.is_empty_reference() {
            continue;
        }

        if seen_keys.contains(&key) {
            accumulator.errors.push(ReportEntry::new(
                kinds::DUPLICATE_KEY,
                categories::STRUCTURE,
                record_number.to_string(),
                String::new(),
                format!("key already present - {}", key.joined_display()),
            ));
        } else {
            seen_keys.insert(key);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::LocalFileByteSource;
    use crate::column::Column;
    use crate::datatypes::registry::Datatype;

    fn write_csv(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn single_column_table(name: &str, has_pk: bool) -> Table {
        let mut table = Table::new(name);
        let mut schema = TableSchema::default();
        let mut id_col = Column::new(1, Datatype::String);
        id_col.name = Some("id".to_string());
        id_col.titles.insert("und".to_string(), vec!["id".to_string()]);
        schema.columns.push(id_col);
        if has_pk {
            schema.primary_key = vec![0];
        }
        table.schema = Some(schema);
        table
    }

    #[test]
    fn duplicate_primary_key_is_detected_in_pass_two() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "t.csv", "id\nW1\nW1\nW2\n");
        let table = single_column_table("t.csv", true);
        let source = LocalFileByteSource::new(dir.path());
        let acc = run_table(&table, &Dialect::default(), &source, 512, 1).unwrap();
        assert_eq!(acc.rows_processed, 3);
        assert_eq!(acc.errors.len(), 1);
        assert_eq!(acc.errors[0].kind, kinds::DUPLICATE_KEY);
        assert_eq!(acc.errors[0].row, "2");
    }

    #[test]
    fn blank_row_is_a_warning_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "t.csv", "id\nW1\n\nW2\n");
        let table = single_column_table("t.csv", false);
        let source = LocalFileByteSource::new(dir.path());
        let acc = run_table(&table, &Dialect::default(), &source, 512, 1).unwrap();
        assert_eq!(acc.rows_processed, 2);
        assert_eq!(acc.warnings.len(), 1);
        assert_eq!(acc.warnings[0].kind, kinds::BLANK_ROWS);
    }

    #[test]
    fn missing_file_reports_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let table = single_column_table("missing.csv", false);
        let source = LocalFileByteSource::new(dir.path());
        let acc = run_table(&table, &Dialect::default(), &source, 512, 1).unwrap();
        assert_eq!(acc.errors.len(), 1);
        assert_eq!(acc.errors[0].kind, kinds::FILE_NOT_FOUND);
    }
}
