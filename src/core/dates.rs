use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

use crate::domain::model::NOT_AVAILABLE;

/// Explicit formats seen across the platform exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%y %I:%M:%S %p", // 04/24/25 8:08:11 PM
    "%Y-%m-%dT%H:%M:%S",    // 2025-05-07T23:35:35
    "%Y-%m-%d %H:%M:%S",    // 2025-05-07 23:35:35
];

const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y", // 04/24/2025
    "%Y-%m-%d", // 2025-05-07
    "%d/%m/%Y", // 24/04/2025
    "%B %d, %Y", // May 7, 2025
    "%b %d, %Y", // May 7, 2025
    "%d-%m-%Y", // 07-05-2025
    "%Y/%m/%d", // already in target format
];

fn relative_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+)\s*(minute|hour|day|week|month|year)s?\s*ago").unwrap()
    })
}

/// Converts a date string in any of the platform formats to `YYYY/MM/DD`.
///
/// Relative phrases like "3 days ago" are resolved against the current time
/// (months count as 30 days, years as 365). Strings that cannot be parsed
/// are passed through unchanged so the original value is never lost.
pub fn standardize_date(date_str: &str) -> String {
    standardize_date_at(date_str, Local::now())
}

pub fn standardize_date_at(date_str: &str, now: DateTime<Local>) -> String {
    let trimmed = date_str.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        return NOT_AVAILABLE.to_string();
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("ago") {
        if let Some(caps) = relative_date_re().captures(&lower) {
            let number: i64 = caps[1].parse().unwrap_or(0);
            let delta = match &caps[2] {
                "minute" => Duration::minutes(number),
                "hour" => Duration::hours(number),
                "day" => Duration::days(number),
                "week" => Duration::weeks(number),
                "month" => Duration::days(number * 30),
                "year" => Duration::days(number * 365),
                _ => Duration::zero(),
            };
            return (now - delta).format("%Y/%m/%d").to_string();
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return dt.format("%Y/%m/%d").to_string();
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.format("%Y/%m/%d").to_string();
        }
    }

    // Flexible fallback for timezone-carrying timestamps.
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format("%Y/%m/%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return dt.format("%Y/%m/%d").to_string();
    }

    trimmed.to_string()
}
