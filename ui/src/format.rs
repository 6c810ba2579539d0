//! Display formatting for dashboard values

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone};
use serde_json::Number;

/// Suffix appended to the collector uptime
pub const HOURS_SUFFIX: &str = "小时";

/// Human-readable duration: "850ms", "1.50s", "2.00min"
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1_000.0)
    } else {
        format!("{:.2}min", ms as f64 / 60_000.0)
    }
}

/// Success rate with two decimals, e.g. "99.50%"
pub fn format_success_rate(rate: f64) -> String {
    format!("{:.2}%", rate)
}

/// Collector uptime, e.g. "3小时"
pub fn format_running_hours(hours: &Number) -> String {
    format!("{}{}", hours, HOURS_SUFFIX)
}

/// Counter value as the backend sent it
pub fn format_count(count: &Number) -> String {
    count.to_string()
}

/// Leading integer of `text`, or 0 when there is none
///
/// "12", " 12 errors" and "+12" all read as 12; "n/a" reads as 0.
pub fn parse_count(text: &str) -> i64 {
    let text = text.trim_start();
    let (sign, digits) = match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

/// Wall-clock time, e.g. "09:05:03"
pub fn format_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%H:%M:%S").to_string()
}

/// Calendar date and time, e.g. "2024/3/9 09:05:03"
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("{} {}", at.format("%Y/%-m/%-d"), format_time(at))
}

/// Download name for an export taken on `date`
pub fn export_filename(format: &str, date: NaiveDate) -> String {
    format!("spring-insight-{}.{}", date.format("%Y-%m-%d"), format)
}
