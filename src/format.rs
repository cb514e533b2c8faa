//! Number and date formatting shared by the CLI report and the TUI

use chrono::NaiveDateTime;

/// Format an integer with thousand separators (e.g., 1234567 -> "1,234,567")
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    // Digits are ASCII, so byte indexing is safe
    for (i, ch) in s.bytes().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch as char);
    }

    result
}

/// Two decimals with thousand separators (e.g., 12345.678 -> "12,345.68")
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return "0.00".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, format_number(cents / 100), cents % 100)
}

/// Calendar day of a timestamp, "-" when missing
pub fn format_day(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.date().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Signed percentage (e.g., "+12.5%"), "n/a" without a baseline
pub fn format_change(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{:+.1}%", p),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(0.0), "0.00");
        assert_eq!(format_decimal(55.5), "55.50");
        assert_eq!(format_decimal(12345.678), "12,345.68");
        assert_eq!(format_decimal(-3.2), "-3.20");
        assert_eq!(format_decimal(-0.001), "0.00");
        assert_eq!(format_decimal(f64::NAN), "0.00");
    }

    #[test]
    fn test_format_day() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(13, 5, 0);
        assert_eq!(format_day(dt), "2024-01-15");
        assert_eq!(format_day(None), "-");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(Some(12.34)), "+12.3%");
        assert_eq!(format_change(Some(-50.0)), "-50.0%");
        assert_eq!(format_change(None), "n/a");
    }
}
