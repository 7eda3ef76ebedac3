//! Timestamp utilities

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// ISO 8601 timestamp with millisecond precision and `Z` suffix
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Long-form date and time for the display header
///
/// e.g. `Saturday, May 17, 2025, 07:05 PM`
pub fn display_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%A, %B %-d, %Y, %I:%M %p").to_string()
}

/// Current local time for the display header
pub fn local_now() -> DateTime<Local> {
    Local::now()
}
