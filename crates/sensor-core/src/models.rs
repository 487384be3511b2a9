use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::YearMonth;
use crate::summation::ExactSum;

/// Number of measurement channels carried by every reading.
pub const NUM_CHANNELS: usize = 6;

// ── Channel ───────────────────────────────────────────────────────────────────

/// One sensor measurement type, in input column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Temperatura,
    Umidade,
    Luminosidade,
    Ruido,
    Eco2,
    Etvoc,
}

impl Channel {
    /// All channels in declaration (column) order.
    pub const ALL: [Channel; NUM_CHANNELS] = [
        Channel::Temperatura,
        Channel::Umidade,
        Channel::Luminosidade,
        Channel::Ruido,
        Channel::Eco2,
        Channel::Etvoc,
    ];

    /// Position of this channel inside [`Reading::values`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in the report's `sensor` column.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Temperatura => "temperatura",
            Channel::Umidade => "umidade",
            Channel::Luminosidade => "luminosidade",
            Channel::Ruido => "ruido",
            Channel::Eco2 => "eco2",
            Channel::Etvoc => "etvoc",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// A single timestamped multi-channel observation from one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Device identifier as it appears in the input.
    pub device: String,
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Channel values, indexed by [`Channel::index`].
    pub values: [f64; NUM_CHANNELS],
}

impl Reading {
    /// The month this reading is aggregated into.
    pub fn period(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }

    /// Composite identity of the accumulator this reading folds into.
    pub fn key(&self) -> AccumulatorKey {
        self.key_ref().into_owned()
    }

    /// [`key`](Self::key) borrowing the device id instead of copying it.
    pub fn key_ref(&self) -> KeyRef<'_> {
        KeyRef {
            device: &self.device,
            period: self.period(),
        }
    }

    pub fn value(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }
}

// ── AccumulatorKey ────────────────────────────────────────────────────────────

/// `(device, year, month)` grouping identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccumulatorKey {
    pub device: String,
    pub period: YearMonth,
}

impl AccumulatorKey {
    pub fn new(device: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            device: device.into(),
            period: YearMonth::new(year, month),
        }
    }
}

/// Borrowed form of [`AccumulatorKey`], used for table lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyRef<'a> {
    pub device: &'a str,
    pub period: YearMonth,
}

impl KeyRef<'_> {
    pub fn into_owned(self) -> AccumulatorKey {
        AccumulatorKey {
            device: self.device.to_string(),
            period: self.period,
        }
    }
}

impl AccumulatorKey {
    pub fn as_key_ref(&self) -> KeyRef<'_> {
        KeyRef {
            device: &self.device,
            period: self.period,
        }
    }
}

// ── ChannelStats ──────────────────────────────────────────────────────────────

/// Running max / min / sum / count for one channel of one accumulator.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    pub max: f64,
    pub min: f64,
    sum: ExactSum,
    pub count: u64,
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
            sum: ExactSum::new(),
            count: 0,
        }
    }
}

impl ChannelStats {
    /// Fold one observed value into the running statistics.
    ///
    /// A NaN never replaces the current max or min, mirroring a plain
    /// `value > max` comparison; it still reaches the sum.
    pub fn observe(&mut self, value: f64) {
        if value > self.max {
            self.max = value;
        }
        if value < self.min {
            self.min = value;
        }
        self.sum.add(value);
        self.count += 1;
    }

    /// Exact sum of every observed value, rounded once.
    pub fn sum(&self) -> f64 {
        self.sum.value()
    }

    /// `sum / count`, or `None` when nothing was observed.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum() / self.count as f64)
    }

    /// Plain-value copy of the statistics, suitable for comparison.
    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary {
            max: self.max,
            min: self.min,
            sum: self.sum(),
            count: self.count,
        }
    }
}

/// Snapshot of a [`ChannelStats`] with the sum already rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSummary {
    pub max: f64,
    pub min: f64,
    pub sum: f64,
    pub count: u64,
}

// ── Accumulator ───────────────────────────────────────────────────────────────

/// Per-channel statistics for every reading sharing one [`AccumulatorKey`].
#[derive(Debug, Clone)]
pub struct Accumulator {
    pub key: AccumulatorKey,
    pub channels: [ChannelStats; NUM_CHANNELS],
}

impl Accumulator {
    /// A fresh accumulator: every channel at `max = -inf`, `min = +inf`,
    /// `sum = 0`, `count = 0`.
    pub fn new(key: AccumulatorKey) -> Self {
        Self {
            key,
            channels: std::array::from_fn(|_| ChannelStats::default()),
        }
    }

    /// Fold all six channel values of `reading` into this accumulator.
    pub fn fold(&mut self, reading: &Reading) {
        debug_assert_eq!(reading.device, self.key.device);
        debug_assert_eq!(reading.period(), self.key.period);
        for (stats, &value) in self.channels.iter_mut().zip(reading.values.iter()) {
            stats.observe(value);
        }
    }

    pub fn channel(&self, channel: Channel) -> &ChannelStats {
        &self.channels[channel.index()]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(device: &str, y: i32, m: u32, d: u32, values: [f64; NUM_CHANNELS]) -> Reading {
        Reading {
            device: device.to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            values,
        }
    }

    // ── Channel ───────────────────────────────────────────────────────────────

    #[test]
    fn test_channel_order_and_names() {
        let names: Vec<&str> = Channel::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["temperatura", "umidade", "luminosidade", "ruido", "eco2", "etvoc"]
        );
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    // ── Reading / key ─────────────────────────────────────────────────────────

    #[test]
    fn test_key_discards_day() {
        let a = reading("dev-1", 2024, 3, 5, [0.0; NUM_CHANNELS]);
        let b = reading("dev-1", 2024, 3, 20, [0.0; NUM_CHANNELS]);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), AccumulatorKey::new("dev-1", 2024, 3));
    }

    #[test]
    fn test_key_distinguishes_device_and_month() {
        let base = reading("dev-1", 2024, 3, 5, [0.0; NUM_CHANNELS]);
        let other_device = reading("dev-2", 2024, 3, 5, [0.0; NUM_CHANNELS]);
        let other_month = reading("dev-1", 2024, 4, 5, [0.0; NUM_CHANNELS]);
        let other_year = reading("dev-1", 2025, 3, 5, [0.0; NUM_CHANNELS]);
        assert_ne!(base.key(), other_device.key());
        assert_ne!(base.key(), other_month.key());
        assert_ne!(base.key(), other_year.key());
    }

    #[test]
    fn test_key_ref_matches_owned_key() {
        let r = reading("dev-1", 2024, 3, 5, [0.0; NUM_CHANNELS]);
        let key = r.key_ref();
        assert_eq!(key.device, "dev-1");
        assert_eq!(key.period, YearMonth::new(2024, 3));
        assert_eq!(key.into_owned(), r.key());
        assert_eq!(r.key().as_key_ref(), key);
    }

    // ── ChannelStats ──────────────────────────────────────────────────────────

    #[test]
    fn test_channel_stats_initial_state() {
        let stats = ChannelStats::default();
        assert_eq!(stats.max, f64::NEG_INFINITY);
        assert_eq!(stats.min, f64::INFINITY);
        assert_eq!(stats.sum(), 0.0);
        assert_eq!(stats.count, 0);
        assert!(stats.mean().is_none());
    }

    #[test]
    fn test_channel_stats_observe() {
        let mut stats = ChannelStats::default();
        for v in [4.0, -2.0, 10.0, 0.5] {
            stats.observe(v);
        }
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.min, -2.0);
        assert_eq!(stats.sum(), 12.5);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean(), Some(3.125));
    }

    #[test]
    fn test_channel_stats_nan_skips_extremes_but_poisons_sum() {
        let mut stats = ChannelStats::default();
        stats.observe(1.0);
        stats.observe(f64::NAN);
        stats.observe(3.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.min, 1.0);
        assert!(stats.sum().is_nan());
        assert_eq!(stats.count, 3);
    }

    // ── Accumulator ───────────────────────────────────────────────────────────

    #[test]
    fn test_accumulator_fold_two_readings() {
        let first = reading("A", 2024, 3, 5, [10.0, 50.0, 300.0, 40.0, 400.0, 10.0]);
        let second = reading("A", 2024, 3, 20, [20.0, 60.0, 100.0, 42.0, 600.0, 30.0]);

        let mut acc = Accumulator::new(first.key());
        acc.fold(&first);
        acc.fold(&second);

        let temp = acc.channel(Channel::Temperatura);
        assert_eq!(temp.max, 20.0);
        assert_eq!(temp.min, 10.0);
        assert_eq!(temp.mean(), Some(15.0));
        assert_eq!(temp.count, 2);

        let lum = acc.channel(Channel::Luminosidade);
        assert_eq!(lum.max, 300.0);
        assert_eq!(lum.min, 100.0);

        assert!(acc.channels.iter().all(|c| c.count == 2));
    }

    #[test]
    fn test_summary_copies_values() {
        let mut stats = ChannelStats::default();
        stats.observe(2.0);
        stats.observe(6.0);
        assert_eq!(
            stats.summary(),
            ChannelSummary {
                max: 6.0,
                min: 2.0,
                sum: 8.0,
                count: 2,
            }
        );
    }
}
