//! Rendering the final accumulator table as a semicolon-delimited report.

use std::path::Path;

use sensor_core::error::{Result, SensorError};
use sensor_core::formatting::format_fixed;
use sensor_core::models::{Accumulator, Channel};
use sensor_core::period::YearMonth;

/// First line of every report.
pub const REPORT_HEADER: &str = "device;ano-mes;sensor;valor_maximo;valor_medio;valor_minimo";

/// Field separator of the report format.
pub const REPORT_SEPARATOR: char = ';';

/// Digits after the decimal point for every numeric column.
pub const REPORT_DECIMALS: usize = 2;

// ── ReportRow ─────────────────────────────────────────────────────────────────

/// One `(device, month, channel)` line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub device: String,
    pub period: YearMonth,
    pub channel: Channel,
    pub max: f64,
    pub mean: f64,
    pub min: f64,
}

impl ReportRow {
    /// Render as `device;YYYY-MM;channel;max;mean;min`.
    pub fn to_line(&self) -> String {
        let sep = REPORT_SEPARATOR;
        format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.device,
            self.period,
            self.channel,
            format_fixed(self.max, REPORT_DECIMALS),
            format_fixed(self.mean, REPORT_DECIMALS),
            format_fixed(self.min, REPORT_DECIMALS),
        )
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// One row per accumulator and channel with at least one observation.
///
/// Rows follow accumulator order, then channel declaration order.
pub fn build_rows(accumulators: &[Accumulator]) -> Vec<ReportRow> {
    accumulators
        .iter()
        .flat_map(|acc| {
            Channel::ALL.into_iter().filter_map(move |channel| {
                let stats = acc.channel(channel);
                let mean = stats.mean()?;
                Some(ReportRow {
                    device: acc.key.device.clone(),
                    period: acc.key.period,
                    channel,
                    max: stats.max,
                    mean,
                    min: stats.min,
                })
            })
        })
        .collect()
}

/// Header plus one line per row, each terminated by `\n`.
pub fn render(rows: &[ReportRow]) -> String {
    let mut out = String::with_capacity(REPORT_HEADER.len() + 1 + rows.len() * 64);
    out.push_str(REPORT_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&row.to_line());
        out.push('\n');
    }
    out
}

/// Write the rendered report to `path`.
///
/// The content goes to a sibling temp file first and is renamed into place,
/// so `path` is never left half-written.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    write_atomically(path, render(rows).as_bytes())
}

/// Write `contents` to `path` via a temp file and rename.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let to_write_error = |source: std::io::Error| SensorError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_write_error)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, contents).map_err(to_write_error)?;
    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(to_write_error(source));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sensor_core::models::{AccumulatorKey, Reading, NUM_CHANNELS};
    use tempfile::TempDir;

    fn reading(device: &str, y: i32, m: u32, d: u32, values: [f64; NUM_CHANNELS]) -> Reading {
        Reading {
            device: device.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            values,
        }
    }

    fn scenario_accumulator() -> Accumulator {
        let mut acc = Accumulator::new(AccumulatorKey::new("A", 2024, 3));
        acc.fold(&reading("A", 2024, 3, 5, [10.0, 50.0, 200.0, 40.0, 400.0, 5.0]));
        acc.fold(&reading("A", 2024, 3, 20, [20.0, 60.0, 100.0, 45.0, 500.0, 15.0]));
        acc
    }

    // ── build_rows ────────────────────────────────────────────────────────────

    #[test]
    fn test_build_rows_one_per_channel() {
        let rows = build_rows(&[scenario_accumulator()]);
        assert_eq!(rows.len(), NUM_CHANNELS);

        let channels: Vec<Channel> = rows.iter().map(|r| r.channel).collect();
        assert_eq!(channels, Channel::ALL.to_vec());

        assert_eq!(rows[0].device, "A");
        assert_eq!(rows[0].period, YearMonth::new(2024, 3));
        assert_eq!(rows[0].max, 20.0);
        assert_eq!(rows[0].mean, 15.0);
        assert_eq!(rows[0].min, 10.0);
    }

    #[test]
    fn test_build_rows_skips_empty_channels() {
        let empty = Accumulator::new(AccumulatorKey::new("idle", 2024, 7));
        let rows = build_rows(&[empty, scenario_accumulator()]);
        assert_eq!(rows.len(), NUM_CHANNELS);
        assert!(rows.iter().all(|r| r.device == "A"));
    }

    #[test]
    fn test_build_rows_follows_accumulator_order() {
        let mut later = Accumulator::new(AccumulatorKey::new("B", 2025, 1));
        later.fold(&reading("B", 2025, 1, 1, [1.0; NUM_CHANNELS]));

        let rows = build_rows(&[later, scenario_accumulator()]);
        assert_eq!(rows[0].device, "B");
        assert_eq!(rows[NUM_CHANNELS].device, "A");
    }

    #[test]
    fn test_build_rows_empty_table() {
        assert!(build_rows(&[]).is_empty());
    }

    // ── render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_row_to_line_format() {
        let row = ReportRow {
            device: "sirrosteste_UCS_AMV-01".to_string(),
            period: YearMonth::new(2024, 4),
            channel: Channel::Eco2,
            max: 1023.456,
            mean: 411.0,
            min: 400.004,
        };
        assert_eq!(
            row.to_line(),
            "sirrosteste_UCS_AMV-01;2024-04;eco2;1023.46;411.00;400.00"
        );
    }

    #[test]
    fn test_render_scenario() {
        let text = render(&build_rows(&[scenario_accumulator()]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], REPORT_HEADER);
        assert_eq!(lines[1], "A;2024-03;temperatura;20.00;15.00;10.00");
        assert_eq!(lines[2], "A;2024-03;umidade;60.00;55.00;50.00");
        assert_eq!(lines[3], "A;2024-03;luminosidade;200.00;150.00;100.00");
        assert_eq!(lines[6], "A;2024-03;etvoc;15.00;10.00;5.00");
        assert_eq!(lines.len(), 1 + NUM_CHANNELS);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_render_no_rows_is_header_only() {
        assert_eq!(render(&[]), format!("{}\n", REPORT_HEADER));
    }

    // ── write_report ──────────────────────────────────────────────────────────

    #[test]
    fn test_write_report_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensor_stats.csv");
        let rows = build_rows(&[scenario_accumulator()]);

        write_report(&path, &rows).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&rows));
        assert!(!dir.path().join("sensor_stats.csv.tmp").exists());
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("nested").join("stats.csv");

        write_report(&path, &[]).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_write_report_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sensor_stats.csv");
        std::fs::write(&path, "stale").unwrap();

        write_report(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{}\n", REPORT_HEADER)
        );
    }

    #[test]
    fn test_write_report_error_carries_path() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should go makes the rename fail.
        let path = dir.path().join("taken");
        std::fs::create_dir_all(path.join("child")).unwrap();

        let err = write_report(&path, &[]).unwrap_err();
        assert!(matches!(err, SensorError::FileWrite { .. }));
        assert!(err.to_string().contains("taken"));
    }
}
