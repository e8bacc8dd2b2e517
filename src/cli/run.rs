use crate::config::{load_config, Config};
use crate::graylog::{GraylogClient, LogSource};
use crate::retrieval::{LogRetriever, RetrieveError};
use crate::rules::create_taggers;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("rule error: {0}")]
    Rule(#[from] crate::rules::RuleError),

    #[error("graylog client error: {0}")]
    Graylog(#[from] crate::graylog::GraylogError),

    #[error("retrieval failed: {0}")]
    Retrieve(#[from] RetrieveError),
}

pub async fn retrieve(config_path: Option<PathBuf>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path.ok_or(
        "config not found (searched ~/.config/logminer/config.yml and /etc/logminer/config.yml); \
         use --config <path> or run 'logminer config init'",
    )?;

    run_retrieval(&config_path, force).await.map_err(|e| e.into())
}

async fn run_retrieval(config_path: &Path, force: bool) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    let retriever = build_retriever(&config)?;
    info!(retriever = %retriever, "Log retriever initialized");

    retriever.retrieve(force).await?;
    Ok(())
}

/// Composition root: wires client, filter and taggers into a retriever.
pub fn build_retriever(config: &Config) -> Result<LogRetriever, RunError> {
    let client = GraylogClient::new(&config.graylog)?;
    info!(client = %client, "Graylog client created");

    let source: Arc<dyn LogSource> = Arc::new(client);
    let filter = LogRetriever::default_filter(config.filter.expressions.as_slice())?;
    let taggers = create_taggers(&config.taggers)?;
    info!(taggers = taggers.len(), "Log taggers created");

    Ok(LogRetriever::new(
        source,
        config.storage.target_dir.clone(),
        filter,
        taggers,
    ))
}
