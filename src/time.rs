//! Timestamp helpers.
//!
//! Records carry ISO-8601 strings. New timestamps are local time with an
//! explicit offset; older files may hold naive local timestamps, which
//! [`parse_timestamp`] also accepts.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone};

/// The current local time as an ISO-8601 string with microseconds.
#[must_use]
pub fn now_iso() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse an ISO-8601 timestamp, with or without an offset.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Format a stored timestamp for display, falling back to the raw value.
#[must_use]
pub fn format_display(value: &str) -> String {
    parse_timestamp(value)
        .map_or_else(|| value.to_string(), |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}
