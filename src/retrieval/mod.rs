pub mod export;
pub mod retriever;
pub mod session;
pub mod watermark;

use std::path::PathBuf;
use thiserror::Error;

pub use retriever::LogRetriever;
pub use session::Session;
pub use watermark::{WatermarkStore, TIMESTAMP_FILENAME};

pub const CORRELATION_ID_FIELD: &str = "correlationId";
pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const MESSAGE_FIELD: &str = "message";

/// Fields requested from Graylog. Every stored entry carries all of them.
pub const EXPORTED_FIELDS: [&str; 3] = [CORRELATION_ID_FIELD, TIMESTAMP_FIELD, MESSAGE_FIELD];

/// Fatal retrieval failure. Retrieval cannot continue without durable storage.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("storage error at '{path}': {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session file: {0}")]
    Csv(#[from] csv::Error),
}

impl RetrieveError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RetrieveError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, RetrieveError>;
