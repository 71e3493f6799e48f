// Utility helpers for parsing and basic statistics.
//
// This module centralizes the "dirty" spreadsheet cell handling so the
// statistics engine can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a raw survey cell into a number while being forgiving about the way
/// spreadsheet exports write answers.
///
/// - Trims whitespace.
/// - Blank cells and dash placeholders (`-`, `–`, `—`) mean "no answer".
/// - Rejects values that contain alphabetic characters.
/// - Accepts a decimal comma (`"4,0"`).
/// - Returns `None` for anything that cannot be safely parsed or is not finite.
pub fn parse_likert_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() || matches!(s, "-" | "–" | "—") {
        return None;
    }
    if s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let s = s.replace(',', ".");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Median of unsorted values; 0 for an empty list.
pub fn median(mut v: Vec<f64>) -> f64 {
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    percentile_sorted(&v, 0.5)
}

/// Percentile `q` (0..=1) of an ascending slice, interpolating linearly
/// between the closest ranks at position `(n - 1) * q`.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with a fixed number of decimal places and
    // locale-aware thousands separators (e.g., `1,234.50`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Like [`format_number`] but renders a missing value as `-`.
pub fn format_optional(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals))
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `1,204 respondents`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_comma_decimals() {
        assert_eq!(parse_likert_safe(Some(" 4 ")), Some(4.0));
        assert_eq!(parse_likert_safe(Some("3,0")), Some(3.0));
        assert_eq!(parse_likert_safe(Some("5.0")), Some(5.0));
    }

    #[test]
    fn placeholders_and_text_are_missing() {
        assert_eq!(parse_likert_safe(None), None);
        assert_eq!(parse_likert_safe(Some("")), None);
        assert_eq!(parse_likert_safe(Some("-")), None);
        assert_eq!(parse_likert_safe(Some(" — ")), None);
        assert_eq!(parse_likert_safe(Some("Alta")), None);
        assert_eq!(parse_likert_safe(Some("NaN")), None);
        assert_eq!(parse_likert_safe(Some("inf")), None);
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(Vec::new()), 0.0);
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&sorted, 0.25), 1.75);
        assert_eq!(percentile_sorted(&sorted, 0.5), 2.5);
        assert_eq!(percentile_sorted(&sorted, 0.75), 3.25);
        assert_eq!(percentile_sorted(&[5.0], 0.75), 5.0);
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(1234.5, 2), "1,234.50");
        assert_eq!(format_number(55.5555, 1), "55.6");
        assert_eq!(format_number(-0.0, 1), "0.0");
        assert_eq!(format_optional(None, 1), "-");
        assert_eq!(format_int(1204usize), "1,204");
    }
}
