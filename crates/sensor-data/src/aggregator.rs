//! Parallel per-device monthly aggregation.
//!
//! The record store is split into one contiguous slice per worker. Every
//! worker walks its slice in order, resolving each reading's
//! `(device, year, month)` key against the shared [`AccumulatorTable`] and
//! folding the reading into the returned accumulator. The phase ends when
//! every worker has been joined.

use std::ops::Range;
use std::thread;

use sensor_core::error::{Result, SensorError};
use sensor_core::models::{Accumulator, Reading};
use sensor_core::settings::TableKind;
use serde::Serialize;
use tracing::debug;

use crate::partition::partition;
use crate::table::{AccumulatorTable, GlobalLockTable, PerEntryLockTable};

// ── Public types ──────────────────────────────────────────────────────────────

/// What one worker did during the aggregation phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    /// Zero-based worker number.
    pub worker: usize,
    /// Index range of the record store this worker consumed.
    pub range: Range<usize>,
    /// Readings folded, always `range.len()`.
    pub folded: usize,
}

/// Final table contents plus per-worker bookkeeping.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Every accumulator, in creation order.
    pub accumulators: Vec<Accumulator>,
    pub workers: Vec<WorkerReport>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Aggregate `readings` with `workers` threads using the table named by
/// `kind`.
pub fn aggregate_with(
    kind: TableKind,
    readings: &[Reading],
    workers: usize,
) -> Result<Aggregation> {
    match kind {
        TableKind::Global => aggregate_into(&GlobalLockTable::new(), readings, workers),
        TableKind::PerEntry => aggregate_into(&PerEntryLockTable::new(), readings, workers),
    }
}

/// Aggregate `readings` into `table` and return its final snapshot.
pub fn aggregate_into<T: AccumulatorTable>(
    table: &T,
    readings: &[Reading],
    workers: usize,
) -> Result<Aggregation> {
    let reports = run_workers(table, readings, workers)?;
    let accumulators = table.snapshot();
    debug!(
        groups = accumulators.len(),
        workers = reports.len(),
        "aggregation finished"
    );
    Ok(Aggregation {
        accumulators,
        workers: reports,
    })
}

/// Fold every reading into `table` using one scoped thread per partition.
///
/// Returns once all workers have terminated. A worker that cannot be spawned
/// or that panics fails the whole phase.
pub fn run_workers<T: AccumulatorTable>(
    table: &T,
    readings: &[Reading],
    workers: usize,
) -> Result<Vec<WorkerReport>> {
    let ranges = partition(readings.len(), workers);

    thread::scope(|scope| -> Result<Vec<WorkerReport>> {
        let mut handles = Vec::with_capacity(ranges.len());
        for (worker, range) in ranges.into_iter().enumerate() {
            let slice = &readings[range.clone()];
            let handle = thread::Builder::new()
                .name(format!("aggregator-{worker}"))
                .spawn_scoped(scope, move || fold_slice(table, worker, range, slice))
                .map_err(|source| SensorError::WorkerSpawn { worker, source })?;
            handles.push((worker, handle));
        }

        // Join every worker before reporting the first failure.
        let joined: Vec<Result<WorkerReport>> = handles
            .into_iter()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .map_err(|_| SensorError::WorkerPanicked { worker })
            })
            .collect();
        joined.into_iter().collect()
    })
}

// ── Worker body ───────────────────────────────────────────────────────────────

fn fold_slice<T: AccumulatorTable>(
    table: &T,
    worker: usize,
    range: Range<usize>,
    slice: &[Reading],
) -> WorkerReport {
    debug!(worker, start = range.start, end = range.end, "worker started");

    for reading in slice {
        let handle = table.find_or_create(reading.key_ref());
        table.fold(&handle, reading);
    }

    debug!(worker, folded = slice.len(), "worker finished");
    WorkerReport {
        worker,
        range,
        folded: slice.len(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
