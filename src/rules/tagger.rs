use super::{compile, LogEntry, RuleError};
use crate::config::types::TaggerConfig;
use regex::Regex;
use std::fmt;

/// Adds one field to log entries, derived from the value of an existing field.
///
/// A value is looked up in three steps: static mappings (label -> patterns),
/// then extractors (the first capture group of the first matching pattern),
/// then the default value.
#[derive(Debug)]
pub struct LogTagger {
    source_field: String,
    target_field: String,
    tag_all: bool,
    default_value: String,
    mappings: Vec<(String, Vec<Regex>)>,
    extractors: Vec<Regex>,
}

impl LogTagger {
    pub fn new(
        source_field: impl Into<String>,
        target_field: impl Into<String>,
        tag_all: bool,
        default_value: impl Into<String>,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            tag_all,
            default_value: default_value.into(),
            mappings: Vec::new(),
            extractors: Vec::new(),
        }
    }

    pub fn from_config(config: &TaggerConfig) -> Result<Self, RuleError> {
        let mut tagger = Self::new(
            &config.source,
            &config.target,
            config.tag_all,
            &config.default_value,
        );
        for (label, expressions) in &config.mappings {
            tagger.add_mapping(label, expressions.as_slice())?;
        }
        for expression in &config.extractors {
            tagger.add_extractor(expression)?;
        }
        Ok(tagger)
    }

    pub fn target_field(&self) -> &str {
        &self.target_field
    }

    /// Maps `label` to the given patterns. Mappings are evaluated in the order
    /// they were added.
    pub fn add_mapping<S: AsRef<str>>(
        &mut self,
        label: &str,
        expressions: &[S],
    ) -> Result<(), RuleError> {
        let patterns = expressions
            .iter()
            .map(|e| compile(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.mappings.push((label.to_string(), patterns));
        Ok(())
    }

    /// Adds an extractor pattern. Patterns without a capture group are ignored;
    /// for patterns with more than one, only the first group is used.
    /// An empty capture counts as no match.
    pub fn add_extractor(&mut self, expression: &str) -> Result<(), RuleError> {
        let pattern = compile(expression)?;
        // captures_len counts the implicit whole-match group
        match pattern.captures_len() - 1 {
            0 => {
                tracing::warn!(
                    pattern = %expression,
                    target_field = %self.target_field,
                    "Extractor pattern has no capture group, ignoring it"
                );
                return Ok(());
            }
            1 => {}
            groups => tracing::warn!(
                pattern = %expression,
                target_field = %self.target_field,
                groups,
                "Extractor pattern has more than one capture group, only the first is used"
            ),
        }
        self.extractors.push(pattern);
        Ok(())
    }

    /// Tags every entry of one session.
    ///
    /// With `tag_all`, the first entry (in session order) that yields a label
    /// decides the value for the whole session.
    pub fn tag_entries(&self, entries: &mut [LogEntry]) {
        for i in 0..entries.len() {
            match self.tag_value(&entries[i]) {
                Some(label) if self.tag_all => {
                    tracing::debug!(
                        label = %label,
                        target_field = %self.target_field,
                        "Tagging all entries of session"
                    );
                    for entry in entries.iter_mut() {
                        entry.set(&self.target_field, label.as_str());
                    }
                    return;
                }
                Some(label) => entries[i].set(&self.target_field, label),
                None => entries[i].set(&self.target_field, self.default_value.as_str()),
            }
        }
    }

    fn tag_value(&self, entry: &LogEntry) -> Option<String> {
        let Some(content) = entry.get(&self.source_field) else {
            tracing::debug!(source = %self.source_field, "Source field missing on entry");
            return None;
        };

        self.mapped_value(content)
            .or_else(|| self.extracted_value(content))
            .or_else(|| {
                tracing::debug!(
                    target_field = %self.target_field,
                    "No matching tag value found"
                );
                None
            })
    }

    fn mapped_value(&self, content: &str) -> Option<String> {
        self.mappings.iter().find_map(|(label, patterns)| {
            let pattern = patterns.iter().find(|p| p.is_match(content))?;
            tracing::debug!(
                pattern = %pattern.as_str(),
                source = %self.source_field,
                value = %content,
                "Mapping matched"
            );
            Some(label.clone())
        })
    }

    fn extracted_value(&self, content: &str) -> Option<String> {
        self.extractors.iter().find_map(|pattern| {
            let value = pattern.captures(content)?.get(1)?.as_str();
            if value.is_empty() {
                return None;
            }
            let value = value.to_string();
            tracing::debug!(
                pattern = %pattern.as_str(),
                source = %self.source_field,
                value = %value,
                "Extractor matched"
            );
            Some(value)
        })
    }
}

impl fmt::Display for LogTagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.mappings.iter().map(|(l, _)| l.as_str()).collect();
        let extractors: Vec<&str> = self.extractors.iter().map(Regex::as_str).collect();
        write!(
            f,
            "LogTagger [source_field <{}>, target_field <{}>, tag_all <{}>, \
             default_value <{}>, mappings <{:?}>, extractors <{:?}>]",
            self.source_field, self.target_field, self.tag_all, self.default_value, labels, extractors
        )
    }
}

/// Builds the ordered list of taggers from configuration.
pub fn create_taggers(configs: &[TaggerConfig]) -> Result<Vec<LogTagger>, RuleError> {
    configs.iter().map(LogTagger::from_config).collect()
}
