use super::{compile, LogEntry, RuleError};
use regex::Regex;
use std::fmt;

/// Removes entries that are incomplete or explicitly excluded.
#[derive(Debug)]
pub struct LogFilter {
    required_fields: Vec<String>,
    filter_field: String,
    patterns: Vec<Regex>,
}

impl LogFilter {
    pub fn new<S: AsRef<str>>(
        required_fields: &[&str],
        filter_field: &str,
        expressions: &[S],
    ) -> Result<Self, RuleError> {
        let patterns = expressions
            .iter()
            .map(|e| compile(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            required_fields: required_fields.iter().map(|f| f.to_string()).collect(),
            filter_field: filter_field.to_string(),
            patterns,
        })
    }

    /// Keeps entries that carry every required field and whose filter field
    /// matches none of the expressions. Relative order is preserved.
    pub fn apply(&self, entries: Vec<LogEntry>) -> Vec<LogEntry> {
        entries
            .into_iter()
            .filter(|entry| {
                if !self.required_fields_present(entry) {
                    tracing::debug!(entry = ?entry, "Removing incomplete entry");
                    return false;
                }
                if self.matches_expressions(entry) {
                    tracing::debug!(entry = ?entry, "Removing filtered entry");
                    return false;
                }
                true
            })
            .collect()
    }

    fn required_fields_present(&self, entry: &LogEntry) -> bool {
        match self
            .required_fields
            .iter()
            .find(|field| entry.non_empty(field).is_none())
        {
            Some(field) => {
                tracing::debug!(field = %field, "Missing or empty required field");
                false
            }
            None => true,
        }
    }

    fn matches_expressions(&self, entry: &LogEntry) -> bool {
        let Some(value) = entry.get(&self.filter_field) else {
            return false;
        };

        match self.patterns.iter().find(|p| p.is_match(value)) {
            Some(pattern) => {
                tracing::debug!(
                    pattern = %pattern.as_str(),
                    field = %self.filter_field,
                    "Pattern matches filter field"
                );
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns: Vec<&str> = self.patterns.iter().map(Regex::as_str).collect();
        write!(
            f,
            "LogFilter [required_fields <{:?}>, filter_field <{}>, patterns <{:?}>]",
            self.required_fields, self.filter_field, patterns
        )
    }
}
