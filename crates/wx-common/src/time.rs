//! Time formatting for map annotations.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Render timestamp shown in the right-hand title: `MM/DD/YYYY HH:MMZ`.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%m/%d/%Y %H:%MZ").to_string()
}

/// Data valid label: `HH:MMZ`.
pub fn format_valid_label(dt: &DateTime<Utc>) -> String {
    dt.format("%H:%MZ").to_string()
}

/// Parse an ISO8601 instant as accepted on the command line.
///
/// Accepts RFC 3339 (`2024-03-05T14:07:00Z`) and the zone-less forms
/// `2024-03-05T14:07:00` / `2024-03-05T14:07`, which are taken as UTC.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}
