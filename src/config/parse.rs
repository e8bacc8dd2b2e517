use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, unexpanded_env_vars};
use crate::retrieval::EXPORTED_FIELDS;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate config text after `$env{...}` expansion.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;
    config.storage.target_dir = expand_tilde(&config.storage.target_dir);

    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let unexpanded = unexpanded_env_vars(yaml_string);
    match unexpanded.len() {
        0 => Ok(()),
        1 => Err(ConfigError::Validation(format!(
            "environment variable $env{{{0}}} is not set (export {0}=... or replace it in the config file)",
            unexpanded[0]
        ))),
        _ => Err(ConfigError::Validation(format!(
            "environment variables are not set: {}",
            unexpanded.join(", ")
        ))),
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.graylog.url.trim().is_empty() {
        errors.push("graylog.url must not be empty".to_string());
    }
    if config.graylog.api_token.is_empty() {
        errors.push("graylog.api_token must not be empty".to_string());
    }
    if config.storage.target_dir.as_os_str().is_empty() {
        errors.push("storage.target_dir must not be empty".to_string());
    }

    for expression in &config.filter.expressions {
        validate_regex("filter.expressions", expression, &mut errors);
    }

    let mut targets = HashSet::new();
    for (i, tagger) in config.taggers.iter().enumerate() {
        validate_tagger(i, tagger, &mut targets, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_tagger(
    index: usize,
    tagger: &TaggerConfig,
    targets: &mut HashSet<String>,
    errors: &mut Vec<String>,
) {
    let context = format!("taggers[{}]", index);

    if tagger.source.is_empty() {
        errors.push(format!("{}: source must not be empty", context));
    }
    if tagger.target.is_empty() {
        errors.push(format!("{}: target must not be empty", context));
    } else if EXPORTED_FIELDS.contains(&tagger.target.as_str()) {
        errors.push(format!(
            "{}: target '{}' would overwrite an exported field",
            context, tagger.target
        ));
    } else if !targets.insert(tagger.target.clone()) {
        errors.push(format!("{}: duplicate target '{}'", context, tagger.target));
    }

    for (label, expressions) in &tagger.mappings {
        for expression in expressions {
            validate_regex(&format!("{}.mappings.{}", context, label), expression, errors);
        }
    }
    for expression in &tagger.extractors {
        validate_regex(&format!("{}.extractors", context), expression, errors);
    }
}

fn validate_regex(context: &str, expression: &str, errors: &mut Vec<String>) {
    if let Err(e) = Regex::new(expression) {
        errors.push(format!("{}: invalid regex '{}': {}", context, expression, e));
    }
}
