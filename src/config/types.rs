use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub graylog: GraylogConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub taggers: Vec<TaggerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraylogConfig {
    pub url: String,
    pub api_token: ApiToken,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub target_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Entries whose `message` matches any of these are dropped.
    #[serde(default)]
    pub expressions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Name of the field the tagger adds.
    pub target: String,
    /// Field the tagger reads.
    pub source: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(deserialize_with = "bool_or_string")]
    pub tag_all: bool,
    #[serde(default)]
    pub mappings: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub extractors: Vec<String>,
}

/// Graylog API token. Only a masked prefix is ever printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn masked(&self) -> String {
        let prefix: String = if self.0.chars().count() > 8 {
            self.0.chars().take(3).collect()
        } else {
            String::new()
        };
        format!("{}******", prefix)
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiToken({})", self.masked())
    }
}

/// Accepts YAML booleans as well as the usual string spellings ("yes", "off", "1", ...).
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Int(i64),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Int(1) => Ok(true),
        BoolOrString::Int(0) => Ok(false),
        BoolOrString::Int(i) => Err(serde::de::Error::custom(format!(
            "invalid truth value {}",
            i
        ))),
        BoolOrString::String(s) => parse_truth_value(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid truth value '{}'", s))
        }),
    }
}

fn parse_truth_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}
