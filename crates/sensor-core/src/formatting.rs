/// Format `value` with exactly `decimals` digits after the point and no
/// grouping, the way the report's numeric columns are written.
///
/// Non-finite values render as `inf`, `-inf` and `NaN`.
///
/// # Examples
///
/// ```
/// use sensor_core::formatting::format_fixed;
///
/// assert_eq!(format_fixed(15.0, 2), "15.00");
/// assert_eq!(format_fixed(-0.126, 2), "-0.13");
/// assert_eq!(format_fixed(1234.567, 2), "1234.57");
/// assert_eq!(format_fixed(f64::NEG_INFINITY, 2), "-inf");
/// ```
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Format a count with thousands separators, for log and console messages.
///
/// # Examples
///
/// ```
/// use sensor_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(999), "999");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
pub fn format_count(count: u64) -> String {
    group_thousands(&count.to_string())
}

/// Insert `,` every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }

    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fixed_pads_decimals() {
        assert_eq!(format_fixed(20.0, 2), "20.00");
        assert_eq!(format_fixed(0.0, 2), "0.00");
        assert_eq!(format_fixed(3.14159, 2), "3.14");
    }

    #[test]
    fn test_format_fixed_negative() {
        assert_eq!(format_fixed(-7.5, 2), "-7.50");
    }

    #[test]
    fn test_format_fixed_non_finite() {
        assert_eq!(format_fixed(f64::INFINITY, 2), "inf");
        assert_eq!(format_fixed(f64::NEG_INFINITY, 2), "-inf");
        assert_eq!(format_fixed(f64::NAN, 2), "NaN");
    }

    #[test]
    fn test_format_count_grouping() {
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(12_345), "12,345");
        assert_eq!(format_count(100_000), "100,000");
        assert_eq!(format_count(9_876_543_210), "9,876,543,210");
    }
}
