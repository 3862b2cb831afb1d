//! Formatted terminal output.
//!
//! We keep formatting code in one place so output changes are localized and
//! easy to pin down in tests.

use chrono::NaiveDate;

use crate::recon::Coverage;

/// `Average TVL for <protocol> from <start> to <end>: $1,234.56`
pub fn format_mean_line(metric: &str, protocol: &str, start: NaiveDate, end: NaiveDate, mean: f64) -> String {
    format!(
        "Average {metric} for {protocol} from {start} to {end}: ${}",
        fmt_thousands(mean, 2)
    )
}

/// Format with `,` thousands separators and fixed decimals.
pub fn fmt_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if value.is_sign_negative() && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// One-line fill summary, e.g. `31 days: 20 observed, 9 interpolated, 0 extrapolated, 2 missing`.
pub fn format_coverage(coverage: &Coverage) -> String {
    format!(
        "{} days: {} observed, {} interpolated, {} extrapolated, {} missing",
        coverage.total(),
        coverage.observed,
        coverage.interpolated,
        coverage.extrapolated,
        coverage.missing
    )
}
