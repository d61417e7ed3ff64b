//! Typed error taxonomy for the validation engine.
//!
//! The engine never panics on malformed input; per-row problems are
//! collected as [`ValidationError`]/[`ValidationWarning`] values, while a
//! handful of genuinely exceptional conditions (failed metadata parse,
//! failed byte-source fetch) use the `thiserror` enums below so callers can
//! match on them instead of string-sniffing an `anyhow::Error`.

use thiserror::Error;

/// A value failed to parse under its column's declared datatype.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure modes specific to interpreting a datatype URI or its format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatatypeError {
    #[error("unknown datatype URI '{0}'")]
    UnknownDatatype(String),
    #[error("'{value}' - {reason}")]
    Invalid { value: String, reason: String },
}

/// The byte-source collaborator contract (spec §6): `fetch(url) ->
/// Result<LocalPath, FetchError>`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("unsupported URL scheme for '{0}'; no byte-source collaborator registered for it")]
    UnsupportedScheme(String),
    #[error("CSV could not be downloaded: {0}")]
    DownloadFailed(String),
}

/// A fatal error building the schema model from a metadata document. Fails
/// only the affected table (spec §4.6, §7); never the whole validation run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("{0}")]
    Invalid(String),
    #[error("foreign key references list column: {0}")]
    ForeignKeyReferencesListColumn(String),
    #[error("foreign key target table '{0}' is not declared in this table group")]
    UnknownTargetTable(String),
    #[error("foreign key references undeclared column '{column}' in table '{table}'")]
    UnknownReferencedColumn { table: String, column: String },
}

/// A single entry in the [`crate::report::WarningsAndErrors`] output (spec §6/§7).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReportEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub row: String,
    pub column: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
}

impl ReportEntry {
    pub fn new(
        kind: impl Into<String>,
        category: impl Into<String>,
        row: impl Into<String>,
        column: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            category: category.into(),
            row: row.into(),
            column: column.into(),
            content: content.into(),
            csv_path: None,
        }
    }

    pub fn with_csv_path(mut self, path: impl Into<String>) -> Self {
        self.csv_path = Some(path.into());
        self
    }
}

/// Error kind constants (spec §7). Kept as `&str` rather than an enum
/// because the CSV-W spec treats them as an open vocabulary (the `type`
/// field round-trips to JSON verbatim) and new datatype URIs mint new
/// `invalid_<datatype>` kinds without a matching Rust variant.
pub mod kinds {
    pub const REQUIRED: &str = "Required";
    pub const MIN_LENGTH: &str = "minLength";
    pub const MAX_LENGTH: &str = "maxLength";
    pub const LENGTH: &str = "length";
    pub const MIN_INCLUSIVE: &str = "minInclusive";
    pub const MAX_INCLUSIVE: &str = "maxInclusive";
    pub const MIN_EXCLUSIVE: &str = "minExclusive";
    pub const MAX_EXCLUSIVE: &str = "maxExclusive";
    pub const FORMAT: &str = "format";
    pub const BLANK_ROWS: &str = "Blank rows";
    pub const RAGGED_ROWS: &str = "ragged_rows";
    pub const MALFORMED_HEADER: &str = "Malformed header";
    pub const EMPTY_COLUMN_NAME: &str = "Empty column name";
    pub const DUPLICATE_COLUMN_NAME: &str = "Duplicate column name";
    pub const INVALID_HEADER: &str = "Invalid Header";
    pub const DUPLICATE_KEY: &str = "duplicate_key";
    pub const UNMATCHED_FOREIGN_KEY_REFERENCE: &str = "unmatched_foreign_key_reference";
    pub const MULTIPLE_MATCHED_ROWS: &str = "multiple_matched_rows";
    pub const FILE_NOT_FOUND: &str = "file_not_found";
    pub const CSV_CANNOT_BE_DOWNLOADED: &str = "csv_cannot_be_downloaded";
    pub const SOURCE_URL_MISMATCH: &str = "source_url_mismatch";
    pub const METADATA: &str = "metadata";

    pub fn invalid_datatype(name: &str) -> String {
        format!("invalid_{name}")
    }
}

pub mod categories {
    pub const SCHEMA_UPPER: &str = "Schema";
    pub const SCHEMA: &str = "schema";
    pub const STRUCTURE: &str = "structure";
    pub const METADATA: &str = "metadata";
}
