use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Format written into query parameters and the watermark file.
/// Exactly three fractional digits, so lexicographic order equals time order.
pub const GRAYLOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Accepts any fractional precision on input.
const GRAYLOG_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("failed to parse timestamp '{value}' with format '{format}': {source}")]
    ParseError {
        value: String,
        format: &'static str,
        #[source]
        source: chrono::ParseError,
    },
}

/// Parse a Graylog timestamp such as `2020-01-01T01:01:01.001Z`.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    NaiveDateTime::parse_from_str(value, GRAYLOG_PARSE_FORMAT)
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .map_err(|e| TimestampError::ParseError {
            value: value.to_string(),
            format: GRAYLOG_TIMESTAMP_FORMAT,
            source: e,
        })
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(GRAYLOG_TIMESTAMP_FORMAT).to_string()
}

pub fn timestamp_format_is_valid(value: &str) -> bool {
    parse_timestamp(value).is_ok()
}

/// The timestamp one millisecond after `timestamp`.
///
/// The export window is closed on its lower bound, so the next window has to
/// start strictly after the last record already stored.
pub fn advance_timestamp(timestamp: &DateTime<Utc>) -> DateTime<Utc> {
    *timestamp + Duration::milliseconds(1)
}
