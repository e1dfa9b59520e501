//! CF-convention time coordinates (`<unit> since <reference>`).

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// Decoded `units` attribute of a time coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CfTimeUnits {
    /// Length of one unit in seconds.
    pub seconds_per_unit: f64,
    pub reference: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse e.g. `"Hour since 2024-03-05T12:00:00Z"` or
    /// `"seconds since 2000-01-01 12:00:00"`.
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let invalid = || NetCdfError::InvalidFormat(format!("unsupported time units '{}'", units));

        let (unit, reference) = units.split_once(" since ").ok_or_else(invalid)?;
        let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
            "second" | "seconds" | "sec" | "secs" | "s" => 1.0,
            "minute" | "minutes" | "min" | "mins" => 60.0,
            "hour" | "hours" | "hr" | "hrs" | "h" => 3600.0,
            "day" | "days" | "d" => 86400.0,
            _ => return Err(invalid()),
        };

        let reference = parse_reference(reference.trim()).ok_or_else(invalid)?;
        Ok(Self {
            seconds_per_unit,
            reference,
        })
    }

    /// Instant of a coordinate value.
    pub fn instant(&self, value: f64) -> Option<DateTime<Utc>> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.seconds_per_unit * 1000.0).round() as i64;
        self.reference.checked_add_signed(Duration::milliseconds(millis))
    }
}

fn parse_reference(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let trimmed = s.trim_end_matches('Z').trim_end_matches(" UTC").trim();
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ncss_hour_units() {
        let units = CfTimeUnits::parse("Hour since 2024-03-05T12:00:00Z").unwrap();
        assert_eq!(units.seconds_per_unit, 3600.0);
        let t = units.instant(2.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_goes_seconds_since_j2000() {
        let units = CfTimeUnits::parse("seconds since 2000-01-01 12:00:00").unwrap();
        let t = units.instant(86400.5).unwrap();
        assert_eq!(t.timestamp_millis(), Utc.with_ymd_and_hms(2000, 1, 2, 12, 0, 0).unwrap().timestamp_millis() + 500);
    }

    #[test]
    fn test_date_only_reference() {
        let units = CfTimeUnits::parse("days since 2023-01-01").unwrap();
        assert_eq!(units.instant(31.0).unwrap(), Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_rejects_unknown() {
        assert!(CfTimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(CfTimeUnits::parse("K").is_err());
        let units = CfTimeUnits::parse("hours since 2000-01-01").unwrap();
        assert!(units.instant(f64::NAN).is_none());
    }
}
