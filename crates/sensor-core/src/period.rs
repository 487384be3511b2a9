//! Calendar-month periods and the eligibility cutoff.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ── YearMonth ─────────────────────────────────────────────────────────────────

/// A calendar month, ordered chronologically (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
}

/// First month whose readings are aggregated (inclusive).
pub const CUTOFF: YearMonth = YearMonth {
    year: 2024,
    month: 3,
};

impl YearMonth {
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The month a calendar date falls in; the day is discarded.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `true` when this month is on or after [`CUTOFF`].
    pub fn is_eligible(&self) -> bool {
        *self >= CUTOFF
    }
}

/// Renders as `YYYY-MM`, both parts zero-padded.
impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ── Timestamp parsing ─────────────────────────────────────────────────────────

/// Parse the calendar date held in the first 10 characters of `timestamp`.
///
/// Anything after the date (time of day, offsets) is ignored. Returns `None`
/// when the prefix is shorter than 10 characters or is not a valid
/// `YYYY-MM-DD` date.
pub fn parse_date_prefix(timestamp: &str) -> Option<NaiveDate> {
    let prefix = timestamp.trim_start().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
