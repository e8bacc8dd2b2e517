pub mod filter;
pub mod tagger;

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

pub use filter::LogFilter;
pub use tagger::{create_taggers, LogTagger};

/// Error type for rule compilation
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("regex compilation error for pattern '{pattern}': {source}")]
    RegexCompilation {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|e| RuleError::RegexCompilation {
        pattern: pattern.to_string(),
        source: e,
    })
}

/// A single exported log entry: field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    fields: HashMap<String, String>,
}

impl LogEntry {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The value of `field`, or `None` when missing or empty.
    pub fn non_empty(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for LogEntry
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
