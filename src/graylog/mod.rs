pub mod client;
pub mod timestamp;

pub use client::{GraylogClient, GraylogError, LogSource};
pub use timestamp::{
    advance_timestamp, format_timestamp, parse_timestamp, timestamp_format_is_valid,
    TimestampError, GRAYLOG_TIMESTAMP_FORMAT,
};
