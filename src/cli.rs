//! Command-line surface (spec §6): a single `validate` subcommand.
//!
//! Grounded on the teacher's clap derive conventions (`#[command(author,
//! version, about)]`, `ValueEnum` for closed option sets, a custom
//! `value_parser` function for a small hand-parsed grammar) — here applied
//! to `--log-level` and `--output` instead of delimiters and boolean
//! formats.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Validate CSV files against CSV-W metadata", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate one or more CSV tables against a CSV-W metadata document
    Validate(ValidateArgs),
}

#[derive(Debug, clap::Args)]
pub struct ValidateArgs {
    /// Path or URL to the normalised CSV-W metadata document
    #[arg(long = "schema")]
    pub schema: String,
    /// Override the table URL(s) declared in the metadata with a local path or URL
    #[arg(long = "csv", action = clap::ArgAction::Append)]
    pub csv: Vec<String>,
    /// Minimum severity written to the log
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
    /// Number of CSV records dispatched to a worker as one batch (spec §4.4/§5)
    #[arg(long = "row-grouping", default_value_t = 512)]
    pub row_grouping: usize,
    /// Maximum number of row-validation batches processed concurrently (spec §5)
    #[arg(long = "parallelism")]
    pub parallelism: Option<usize>,
    /// Output format for the warnings/errors report
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Human)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl ValidateArgs {
    /// Resolves a CSV-W metadata path/URL to a local filesystem path
    /// (the engine only runs against local metadata today; §C's
    /// `LocalFileByteSource` serves remote-looking strings verbatim).
    pub fn schema_path(&self) -> PathBuf {
        PathBuf::from(self.schema.strip_prefix("file://").unwrap_or(&self.schema))
    }

    pub fn degree_of_parallelism(&self) -> usize {
        self.parallelism
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }
}
