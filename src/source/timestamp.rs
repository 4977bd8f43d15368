use chrono::{DateTime, Duration, DurationRound, NaiveDateTime, RoundingError, TimeZone, Utc};
use thiserror::Error;

/// Rendering used for every `date` in the output series.
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Offset-aware layouts tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

// Layouts without an offset are interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("failed to parse timestamp '{0}'")]
    Unrecognized(String),

    #[error("failed to round timestamp to the minute: {0}")]
    Rounding(#[from] RoundingError),

    #[error("timestamp out of range: {0}")]
    OutOfRange(DateTime<Utc>),
}

/// Parse a timestamp field into a UTC instant.
///
/// Accepts RFC 3339 / ISO-8601 with an offset (converted to UTC) and the
/// `YYYY-MM-DD HH:MM:SS[.ffffff]` layout without one, which is assumed UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimestampError::Unrecognized(value.to_string()))
}

/// Round up to the start of the next minute unless already minute-aligned.
pub fn ceil_to_minute(ts: DateTime<Utc>) -> Result<DateTime<Utc>, TimestampError> {
    let floor = ts.duration_trunc(Duration::minutes(1))?;
    if floor == ts {
        return Ok(ts);
    }

    floor
        .checked_add_signed(Duration::minutes(1))
        .ok_or(TimestampError::OutOfRange(ts))
}

pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format(OUTPUT_DATE_FORMAT).to_string()
}
