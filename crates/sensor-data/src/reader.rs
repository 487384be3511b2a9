//! Pipe-delimited input loading.
//!
//! Reads the device export (`devices.csv`), decodes each row into a
//! [`Reading`], and keeps only rows dated on or after the cutoff month. The
//! result is the immutable record store the aggregation phase works on.

use std::borrow::Cow;
use std::io::BufRead;
use std::path::Path;

use sensor_core::error::{Result, SensorError};
use sensor_core::models::{Reading, NUM_CHANNELS};
use sensor_core::period::parse_date_prefix;
use serde::Serialize;
use tracing::{debug, warn};

/// Field separator of the input format.
pub const FIELD_SEPARATOR: char = '|';

const DEVICE_FIELD: usize = 1;
const TIMESTAMP_FIELD: usize = 3;
const FIRST_VALUE_FIELD: usize = 4;
const MIN_FIELDS: usize = FIRST_VALUE_FIELD + NUM_CHANNELS;

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters describing what happened to the rows of one input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Data rows seen (header and blank lines excluded).
    pub rows_read: u64,
    /// Rows that made it into the record store.
    pub rows_kept: u64,
    /// Well-formed rows dated before the cutoff month.
    pub rows_before_cutoff: u64,
    /// Rows with too few fields, no device id or an unparseable date.
    pub rows_malformed: u64,
    /// Numeric fields with no numeric prefix, decoded as `0.0`.
    pub values_defaulted: u64,
    /// Rows that were not valid UTF-8 and were decoded lossily.
    pub rows_not_utf8: u64,
}

/// A decoded row plus how many of its numeric fields fell back to `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub reading: Reading,
    pub defaulted_values: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load every eligible reading from `path`, preserving input order.
///
/// The first line is a header and is always discarded. Blank lines are
/// ignored, malformed rows are skipped and counted. Failing to open or read
/// the file is fatal.
pub fn load_readings(path: &Path) -> Result<(Vec<Reading>, LoadStats)> {
    let file = std::fs::File::open(path).map_err(|source| SensorError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);
    let (readings, stats) = decode_lines(reader).map_err(|source| SensorError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        "File {}: {} read, {} kept, {} before cutoff, {} malformed",
        path.display(),
        stats.rows_read,
        stats.rows_kept,
        stats.rows_before_cutoff,
        stats.rows_malformed,
    );
    if stats.rows_malformed > 0 {
        warn!(
            "Skipped {} malformed rows in {}",
            stats.rows_malformed,
            path.display()
        );
    }
    if stats.rows_not_utf8 > 0 {
        warn!(
            "{} rows in {} were not valid UTF-8; invalid bytes replaced",
            stats.rows_not_utf8,
            path.display()
        );
    }

    Ok((readings, stats))
}

/// Decode the rows of an already-open input stream.
///
/// Lines are split on raw `\n` bytes. A line that is not valid UTF-8 is
/// decoded with replacement characters rather than failing the stream.
pub fn decode_lines<R: BufRead>(reader: R) -> std::io::Result<(Vec<Reading>, LoadStats)> {
    let mut readings = Vec::new();
    let mut stats = LoadStats::default();

    for raw in reader.split(b'\n').skip(1) {
        let raw = raw?;
        let raw = raw.strip_suffix(b"\r").unwrap_or(&raw);
        let line = String::from_utf8_lossy(raw);
        if line.trim().is_empty() {
            continue;
        }
        stats.rows_read += 1;
        if matches!(line, Cow::Owned(_)) {
            stats.rows_not_utf8 += 1;
        }

        let Some(row) = parse_line(&line) else {
            stats.rows_malformed += 1;
            continue;
        };
        stats.values_defaulted += row.defaulted_values as u64;

        if !row.reading.period().is_eligible() {
            stats.rows_before_cutoff += 1;
            continue;
        }

        stats.rows_kept += 1;
        readings.push(row.reading);
    }

    Ok((readings, stats))
}

/// Decode one data row.
///
/// Field 1 is the device id, field 3 a timestamp starting with `YYYY-MM-DD`,
/// fields 4–9 the six channel values. Returns `None` when the row has fewer
/// than 10 fields, an empty device id, or no valid date.
pub fn parse_line(line: &str) -> Option<ParsedRow> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }

    let device = fields[DEVICE_FIELD].trim();
    if device.is_empty() {
        return None;
    }
    let date = parse_date_prefix(fields[TIMESTAMP_FIELD])?;

    let mut values = [0.0; NUM_CHANNELS];
    let mut defaulted_values = 0;
    for (slot, raw) in values
        .iter_mut()
        .zip(&fields[FIRST_VALUE_FIELD..MIN_FIELDS])
    {
        match parse_number_prefix(raw) {
            Some(v) => *slot = v,
            None => defaulted_values += 1,
        }
    }

    Some(ParsedRow {
        reading: Reading {
            device: device.to_string(),
            date,
            values,
        },
        defaulted_values,
    })
}

/// Parse the longest numeric prefix of `raw` the way C's `atof` does:
/// leading whitespace is skipped and anything after the number is ignored,
/// so `"24,5"` reads as `24.0`. `None` when there is no numeric prefix.
fn parse_number_prefix(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    for word in ["infinity", "inf", "nan"] {
        let matched = bytes[end..]
            .get(..word.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(word.as_bytes()));
        if matched {
            return text[..end + word.len()].parse().ok();
        }
    }

    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse().ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
