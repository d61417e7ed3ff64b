pub mod byte_source;
pub mod cli;
pub mod column;
pub mod datatypes;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod io_utils;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod row;
pub mod table;

use std::env;
use std::sync::OnceLock;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use log::{LevelFilter, error, info};

use crate::cli::{Cli, Commands, OutputFormat};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(level: LevelFilter) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csvw_validate", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => {
            init_logging(args.log_level.into());
            run_operation("validate", || handle_validate(&args))
        }
    }
}

fn handle_validate(args: &cli::ValidateArgs) -> Result<()> {
    let report = engine::execute(args).context("Running CSV-W validation")?;

    match args.output {
        OutputFormat::Human => print!("{}", report.render_human()),
        OutputFormat::Json => println!(
            "{}",
            report.to_json().context("Serialising validation report")?
        ),
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(anyhow!(
            "Validation found {} error(s), {} warning(s)",
            report.errors.len(),
            report.warnings.len()
        ))
    }
}

fn run_operation<F>(name: &str, op: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let start_clock = Utc::now();
    let start_instant = Instant::now();
    let result = op();
    let end_clock = Utc::now();
    let duration_secs = start_instant.elapsed().as_secs_f64();
    let start_str = start_clock.to_rfc3339_opts(SecondsFormat::Millis, true);
    let end_str = end_clock.to_rfc3339_opts(SecondsFormat::Millis, true);

    match &result {
        Ok(_) => info!(
            "Operation '{name}' completed (status=ok)\nstart: {start_str}\nend: {end_str}\nduration_secs: {duration_secs:.3}"
        ),
        Err(err) => error!(
            "Operation '{name}' failed (status=error)\nstart: {start_str}\nend: {end_str}\nduration_secs: {duration_secs:.3}\nerror: {err:?}"
        ),
    }

    result
}
