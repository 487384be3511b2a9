use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

// ── TableKind ──────────────────────────────────────────────────────────────────

/// Which accumulator table implementation the aggregation phase uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableKind {
    /// One table-wide lock guards lookups and folds alike.
    Global,
    /// The table-wide lock guards lookups only; each group has its own lock.
    #[default]
    PerEntry,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Global => f.write_str("global"),
            TableKind::PerEntry => f.write_str("per-entry"),
        }
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Per-device monthly statistics for IoT sensor readings
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sensor-stats",
    about = "Per-device monthly statistics for IoT sensor readings",
    version
)]
pub struct Settings {
    /// Pipe-delimited input file
    #[arg(long, default_value = "devices.csv")]
    pub input: PathBuf,

    /// Semicolon-delimited report to write
    #[arg(long, default_value = "sensor_stats.csv")]
    pub output: PathBuf,

    /// Maximum number of aggregation workers (defaults to available CPUs)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Accumulator table implementation
    #[arg(long, value_enum, default_value_t = TableKind::PerEntry)]
    pub table: TableKind,

    /// Also write a JSON run summary to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// The log level to install, with `--debug` taking precedence.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Requested worker cap as a `usize`, if one was given.
    pub fn worker_limit(&self) -> Option<usize> {
        self.workers.map(|w| w as usize)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
