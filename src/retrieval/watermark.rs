use super::{Result, RetrieveError};
use crate::graylog::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FILENAME: &str = "last_included_timestamp";

/// Persists the timestamp of the newest stored entry.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(target_dir: &Path) -> Self {
        Self {
            path: target_dir.join(TIMESTAMP_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored watermark, or the Unix epoch if there is none.
    ///
    /// An unreadable or malformed file is logged and treated as missing.
    pub async fn load(&self) -> DateTime<Utc> {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) if metadata.is_file() => {
                tracing::info!(path = %self.path.display(), "Reading last included timestamp");
                match tokio::fs::read_to_string(&self.path).await {
                    Ok(content) => {
                        let line = content.lines().next().unwrap_or("");
                        match parse_timestamp(line) {
                            Ok(timestamp) => {
                                tracing::info!(timestamp = %line, "Timestamp of last retrieved log entry");
                                return timestamp;
                            }
                            Err(e) => {
                                tracing::error!(timestamp = %line, error = %e, "Invalid timestamp format");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            path = %self.path.display(),
                            error = %e,
                            "Failed to read last included timestamp"
                        );
                    }
                }
            }
            _ => {
                tracing::info!(
                    path = %self.path.display(),
                    "No last included timestamp found in target directory"
                );
            }
        }

        let default = DateTime::<Utc>::UNIX_EPOCH;
        tracing::info!(timestamp = %format_timestamp(&default), "Using default timestamp");
        default
    }

    pub async fn save(&self, timestamp: &DateTime<Utc>) -> Result<()> {
        let value = format_timestamp(timestamp);
        tracing::info!(path = %self.path.display(), timestamp = %value, "Storing timestamp of last log entry");
        tokio::fs::write(&self.path, value)
            .await
            .map_err(RetrieveError::io(&self.path))
    }
}
