//! Top-level orchestration (spec §2): metadata intake → per-table
//! pipelines → cross-table integrity → `WarningsAndErrors`.
//!
//! Grounded on `verify.rs::execute`'s overall shape: load the schema, loop
//! over inputs, collect outcomes, report — generalised from one schema/one
//! file to a table group and its cross-table integrity pass.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::byte_source::{ByteSource, LocalFileByteSource};
use crate::cli::ValidateArgs;
use crate::error::{ReportEntry, categories, kinds};
use crate::integrity;
use crate::metadata;
use crate::model::TableGroup;
use crate::pipeline::{self, TableAccumulator};
use crate::report::WarningsAndErrors;

/// Runs a full validation for the given CLI arguments (spec §6).
pub fn execute(args: &ValidateArgs) -> Result<WarningsAndErrors> {
    let schema_path = args.schema_path();
    let mut group = metadata::load_from_path(&schema_path)
        .with_context(|| format!("Loading CSV-W metadata from {schema_path:?}"))?;

    let mut mismatch_warnings = Vec::new();
    if !args.csv.is_empty() {
        for (table, override_url) in group.tables.iter_mut().zip(args.csv.iter()) {
            if source_basename(&table.url) != source_basename(override_url) {
                mismatch_warnings.push(
                    ReportEntry::new(
                        kinds::SOURCE_URL_MISMATCH,
                        categories::STRUCTURE,
                        String::new(),
                        String::new(),
                        format!(
                            "declared source '{}' overridden with '{override_url}'",
                            table.url
                        ),
                    )
                    .with_csv_path(override_url.clone()),
                );
            }
            table.url = override_url.clone();
        }
    }

    let base_dir = schema_path.parent().unwrap_or_else(|| Path::new("."));
    let byte_source = LocalFileByteSource::new(base_dir);

    let mut report = run_with_byte_source(
        &group,
        &byte_source,
        args.row_grouping,
        args.degree_of_parallelism(),
    )?;
    report.warnings.extend(mismatch_warnings);
    Ok(report)
}

/// The final path segment of a declared or overriding table URL, used to
/// detect an override that points at a differently-named file (spec §7
/// `source_url_mismatch`).
fn source_basename(url: &str) -> String {
    Path::new(url)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| url.to_string())
}

/// Runs the table pipelines and integrity check for an already-built
/// `TableGroup`. Split out from [`execute`] so tests (and any future
/// embedding of the engine) can supply an in-memory [`ByteSource`].
pub fn run_with_byte_source(
    group: &TableGroup,
    byte_source: &dyn ByteSource,
    row_grouping: usize,
    parallelism: usize,
) -> Result<WarningsAndErrors> {
    info!("Validating {} table(s)", group.tables.len());

    let mut accumulators: Vec<TableAccumulator> = Vec::with_capacity(group.tables.len());
    for table in &group.tables {
        let mut accumulator = pipeline::run_table(
            table,
            &group.dialect,
            byte_source,
            row_grouping.max(1),
            parallelism.max(1),
        )
        .with_context(|| format!("Validating table '{}'", table.url))?;

        for message in &table.metadata_errors {
            accumulator.errors.push(
                ReportEntry::new(
                    kinds::METADATA,
                    categories::METADATA,
                    String::new(),
                    String::new(),
                    message.clone(),
                )
                .with_csv_path(table.url.clone()),
            );
        }

        accumulators.push(accumulator);
    }

    integrity::check_group(group, &mut accumulators);

    let mut report = WarningsAndErrors::default();
    for (table, accumulator) in group.tables.iter().zip(accumulators) {
        if table.suppress_output {
            continue;
        }
        report.warnings.extend(accumulator.warnings);
        report.errors.extend(accumulator.errors);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{LogLevel, OutputFormat};

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn empty_tables_produce_no_warnings_or_errors() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "parent.csv", "id\n");
        write(dir.path(), "child.csv", "id\n");
        write(
            dir.path(),
            "metadata.json",
            r#"{
                "tables": [
                    {"url": "parent.csv", "tableSchema": {
                        "columns": [{"name": "id", "datatype": "string"}],
                        "primaryKey": "id"
                    }},
                    {"url": "child.csv", "tableSchema": {
                        "columns": [{"name": "id", "datatype": "string"}],
                        "foreignKeys": [{
                            "columnReference": "id",
                            "reference": {"resource": "parent.csv", "columnReference": "id"}
                        }]
                    }}
                ]
            }"#,
        );

        let args = ValidateArgs {
            schema: dir.path().join("metadata.json").display().to_string(),
            csv: Vec::new(),
            log_level: LogLevel::Info,
            row_grouping: 512,
            parallelism: Some(1),
            output: OutputFormat::Human,
        };

        let report = execute(&args).unwrap();
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn csv_override_with_a_different_basename_warns_of_the_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "actual.csv", "id\n1\n");
        write(
            dir.path(),
            "metadata.json",
            r#"{
                "tables": [{"url": "declared.csv", "tableSchema": {
                    "columns": [{"name": "id", "datatype": "string"}]
                }}]
            }"#,
        );

        let args = ValidateArgs {
            schema: dir.path().join("metadata.json").display().to_string(),
            csv: vec![dir.path().join("actual.csv").display().to_string()],
            log_level: LogLevel::Info,
            row_grouping: 512,
            parallelism: Some(1),
            output: OutputFormat::Human,
        };

        let report = execute(&args).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, crate::error::kinds::SOURCE_URL_MISMATCH);
    }

    #[test]
    fn csv_override_with_the_same_basename_is_not_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("alt")).unwrap();
        write(&dir.path().join("alt"), "declared.csv", "id\n1\n");
        write(
            dir.path(),
            "metadata.json",
            r#"{
                "tables": [{"url": "declared.csv", "tableSchema": {
                    "columns": [{"name": "id", "datatype": "string"}]
                }}]
            }"#,
        );

        let args = ValidateArgs {
            schema: dir.path().join("metadata.json").display().to_string(),
            csv: vec![dir.path().join("alt").join("declared.csv").display().to_string()],
            log_level: LogLevel::Info,
            row_grouping: 512,
            parallelism: Some(1),
            output: OutputFormat::Human,
        };

        let report = execute(&args).unwrap();
        assert!(report.warnings.is_empty());
    }
}
