use super::timestamp::format_timestamp;
use crate::config::types::{ApiToken, GraylogConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::Url;
use std::fmt;
use thiserror::Error;

const ABS_SEARCH_API_PATH: &str = "api/search/universal/absolute/export";

#[derive(Debug, Error)]
pub enum GraylogError {
    #[error("invalid Graylog url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GraylogError>;

/// A source of exported log lines.
///
/// `None` means nothing could be retrieved this round. Implementations log
/// the reason themselves; callers treat it like an empty export.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Export all entries in `[since, now)` with the given fields as CSV lines
    /// (header first).
    async fn fetch(&self, since: DateTime<Utc>, fields: &[&str]) -> Option<Vec<String>>;
}

/// Client for the absolute-search export endpoint of the Graylog REST API.
pub struct GraylogClient {
    base_url: Url,
    export_url: Url,
    api_token: ApiToken,
    client: reqwest::Client,
}

impl GraylogClient {
    pub fn new(config: &GraylogConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| GraylogError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;
        let export_url = base_url
            .join(ABS_SEARCH_API_PATH)
            .map_err(|e| GraylogError::InvalidUrl {
                url: config.url.clone(),
                reason: e.to_string(),
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url,
            export_url,
            api_token: config.api_token.clone(),
            client: builder.build()?,
        })
    }

    pub fn export_url(&self) -> &Url {
        &self.export_url
    }

    fn query_parameters(since: &DateTime<Utc>, fields: &[&str]) -> Vec<(&'static str, String)> {
        vec![
            ("query", "*".to_string()),
            ("batch_size", "0".to_string()),
            ("fields", fields.join(",")),
            ("from", format_timestamp(since)),
            ("to", format_timestamp(&Utc::now())),
        ]
    }
}

#[async_trait]
impl LogSource for GraylogClient {
    async fn fetch(&self, since: DateTime<Utc>, fields: &[&str]) -> Option<Vec<String>> {
        let params = Self::query_parameters(&since, fields);
        let (from, to) = (&params[3].1, &params[4].1);
        tracing::info!(from = %from, to = %to, url = %self.base_url, "Retrieving log entries");

        let response = match self
            .client
            .get(self.export_url.clone())
            .header(ACCEPT, "text/csv")
            .basic_auth(self.api_token.expose(), Some("token"))
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %self.base_url, error = %e, "Log retrieval request failed");
                return None;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(status = %status, error = %e, "Failed to read export response body");
                return None;
            }
        };

        if status != reqwest::StatusCode::OK {
            tracing::error!(
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or(""),
                body = %body,
                "Log retrieval failed"
            );
            return None;
        }

        Some(body.lines().map(str::to_string).collect())
    }
}

impl fmt::Display for GraylogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GraylogClient [url <{}> api_token <{}>]",
            self.base_url, self.api_token
        )
    }
}

impl fmt::Debug for GraylogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraylogClient")
            .field("base_url", &self.base_url.as_str())
            .field("export_url", &self.export_url.as_str())
            .field("api_token", &self.api_token)
            .finish()
    }
}
