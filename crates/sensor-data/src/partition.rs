//! Splitting the record store into per-worker slices.

use std::num::NonZeroUsize;
use std::ops::Range;

use tracing::debug;

/// Split `0..len` into `workers` contiguous, non-overlapping ranges.
///
/// Range sizes differ by at most one; the first `len % workers` ranges get
/// the extra element. `workers` is clamped to `len`, so no range is ever
/// empty. Returns no ranges when `len` or `workers` is zero.
///
/// # Examples
///
/// ```
/// use sensor_data::partition::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..7, 7..10]);
/// assert_eq!(partition(2, 8), vec![0..1, 1..2]);
/// ```
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.min(len);
    if workers == 0 {
        return Vec::new();
    }

    let base = len / workers;
    let remainder = len % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let end = start + base + usize::from(i < remainder);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Number of CPUs the process may use, falling back to 1 when unknown.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Resolve the worker count for `record_count` readings.
///
/// Uses `requested` when given, otherwise the available parallelism, and
/// never more workers than readings. Always at least 1.
pub fn resolve_worker_count(requested: Option<usize>, record_count: usize) -> usize {
    let limit = requested.unwrap_or_else(available_workers).max(1);
    let workers = limit.min(record_count).max(1);
    debug!(requested = ?requested, record_count, workers, "resolved worker count");
    workers
}

// ── Tests ─────────────────────────────────────────────────────────────────────
