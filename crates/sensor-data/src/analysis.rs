//! End-to-end statistics pipeline.
//!
//! Loads the input, aggregates it in parallel and writes the report,
//! returning a [`RunSummary`] describing the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use sensor_core::error::Result;
use sensor_core::formatting::format_count;
use sensor_core::settings::{Settings, TableKind};
use serde::Serialize;
use tracing::info;

use crate::aggregator::{aggregate_with, WorkerReport};
use crate::partition::resolve_worker_count;
use crate::reader::{load_readings, LoadStats};
use crate::report::{build_rows, write_atomically, write_report};

// ── Public types ──────────────────────────────────────────────────────────────

/// Inputs of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Upper bound on worker threads; `None` means available parallelism.
    pub workers: Option<usize>,
    pub table: TableKind,
}

impl From<&Settings> for RunConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            input: settings.input.clone(),
            output: settings.output.clone(),
            workers: settings.worker_limit(),
            table: settings.table,
        }
    }
}

/// Metadata produced by a run that wrote a report.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// RFC 3339 timestamp when the run finished.
    pub generated_at: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub load: LoadStats,
    pub table: TableKind,
    pub workers: Vec<WorkerReport>,
    /// Distinct `(device, year, month)` groups.
    pub groups: usize,
    /// Report lines written, header excluded.
    pub rows_written: usize,
    pub load_time_seconds: f64,
    pub aggregate_time_seconds: f64,
    pub write_time_seconds: f64,
}

impl RunSummary {
    /// Write the summary to `path` as pretty-printed JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomically(path, json.as_bytes())
    }
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No reading survived the cutoff; nothing was written.
    NothingToDo(LoadStats),
    /// The report was written.
    Written(RunSummary),
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline.
///
/// 1. Load eligible readings from `config.input` (fatal on I/O error).
/// 2. Stop with [`RunOutcome::NothingToDo`] if none are left.
/// 3. Aggregate them across the resolved number of workers.
/// 4. Write the report to `config.output`.
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    // ── Step 1: Load readings ─────────────────────────────────────────────────
    let load_start = Instant::now();
    let (readings, load) = load_readings(&config.input)?;
    let load_time = load_start.elapsed().as_secs_f64();

    info!(
        "Loaded {} eligible readings from {} ({} rows read)",
        format_count(load.rows_kept),
        config.input.display(),
        format_count(load.rows_read),
    );

    // ── Step 2: Nothing to do? ────────────────────────────────────────────────
    if readings.is_empty() {
        info!("No records found after March 2024");
        return Ok(RunOutcome::NothingToDo(load));
    }

    // ── Step 3: Aggregate ─────────────────────────────────────────────────────
    let workers = resolve_worker_count(config.workers, readings.len());
    let aggregate_start = Instant::now();
    let aggregation = aggregate_with(config.table, &readings, workers)?;
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    info!(
        "Aggregated into {} groups with {} workers ({} table)",
        format_count(aggregation.accumulators.len() as u64),
        workers,
        config.table,
    );

    // ── Step 4: Report ────────────────────────────────────────────────────────
    let write_start = Instant::now();
    let rows = build_rows(&aggregation.accumulators);
    write_report(&config.output, &rows)?;
    let write_time = write_start.elapsed().as_secs_f64();

    info!(
        "Wrote {} rows to {}",
        format_count(rows.len() as u64),
        config.output.display()
    );

    Ok(RunOutcome::Written(RunSummary {
        generated_at: Utc::now().to_rfc3339(),
        input: config.input.clone(),
        output: config.output.clone(),
        load,
        table: config.table,
        groups: aggregation.accumulators.len(),
        workers: aggregation.workers,
        rows_written: rows.len(),
        load_time_seconds: load_time,
        aggregate_time_seconds: aggregate_time,
        write_time_seconds: write_time,
    }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
