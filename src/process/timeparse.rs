//! Relative-timestamp resolution. The maps service reports review ages as
//! Indonesian phrases ("3 bulan yang lalu"); they are resolved against the
//! place's scrape timestamp, not wall-clock now, so reprocessing unchanged
//! raw stores yields identical dates.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)").unwrap())
}

/// Resolve a relative phrase to a calendar date anchored at `anchor`.
/// Months count as 30 days, years as 365, matching the upstream data's own
/// precision. Unknown phrases resolve to `None`.
pub fn resolve_relative(text: &str, anchor: DateTime<Utc>) -> Option<NaiveDate> {
    let normalized = text.to_lowercase().replace("diedit", "").replace("edited", "");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return None;
    }

    let count = number_re()
        .captures(normalized)
        .and_then(|c| c[1].parse::<i64>().ok())
        .unwrap_or(1);

    let delta = if normalized.contains("menit")
        || normalized.contains("detik")
        || normalized.contains("baru saja")
    {
        Duration::zero()
    } else if normalized.contains("jam") {
        Duration::hours(count)
    } else if normalized.contains("hari") {
        Duration::days(count)
    } else if normalized.contains("minggu") {
        Duration::weeks(count)
    } else if normalized.contains("bulan") {
        Duration::days(count * 30)
    } else if normalized.contains("tahun") {
        Duration::days(count * 365)
    } else {
        return None;
    };

    Some((anchor - delta).date_naive())
}

/// Resolved date in the `YYYY-MM-DD` form the processed dataset carries,
/// or an empty string when the phrase is not parseable.
pub fn resolve_to_iso(text: &str, anchor: DateTime<Utc>) -> String {
    resolve_relative(text, anchor)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn days_weeks_months_years() {
        assert_eq!(resolve_to_iso("3 hari yang lalu", anchor()), "2025-06-12");
        assert_eq!(resolve_to_iso("2 minggu yang lalu", anchor()), "2025-06-01");
        assert_eq!(resolve_to_iso("2 bulan yang lalu", anchor()), "2025-04-16");
        assert_eq!(resolve_to_iso("1 tahun yang lalu", anchor()), "2024-06-15");
    }

    #[test]
    fn recent_phrases_resolve_to_anchor_date() {
        assert_eq!(resolve_to_iso("baru saja", anchor()), "2025-06-15");
        assert_eq!(resolve_to_iso("5 menit yang lalu", anchor()), "2025-06-15");
        assert_eq!(resolve_to_iso("3 jam yang lalu", anchor()), "2025-06-15");
    }

    #[test]
    fn missing_count_defaults_to_one() {
        assert_eq!(resolve_to_iso("sehari yang lalu", anchor()), "2025-06-14");
        assert_eq!(resolve_to_iso("setahun yang lalu", anchor()), "2024-06-15");
    }

    #[test]
    fn edited_marker_is_ignored() {
        assert_eq!(
            resolve_to_iso("Diedit 2 hari yang lalu", anchor()),
            "2025-06-13"
        );
    }

    #[test]
    fn unknown_phrases_are_empty() {
        assert_eq!(resolve_to_iso("", anchor()), "");
        assert_eq!(resolve_to_iso("kemarin sore di pantai", anchor()), "");
    }
}
