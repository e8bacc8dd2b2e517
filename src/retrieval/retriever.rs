use super::export::parse_export;
use super::session::{
    duplicate_file_names, group_by_correlation_id, header_with_message_last, Session,
};
use super::watermark::WatermarkStore;
use super::{Result, RetrieveError, EXPORTED_FIELDS, MESSAGE_FIELD, TIMESTAMP_FIELD};
use crate::graylog::{advance_timestamp, parse_timestamp, LogSource};
use crate::rules::{LogFilter, LogTagger, RuleError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Retrieves log entries from a [`LogSource`] and stores them grouped by
/// correlation id, one CSV file per session.
///
/// A retriever owns its target directory: runs are serialized by an internal
/// lock, so share one retriever (e.g. behind an `Arc`) between all callers
/// using the same directory.
pub struct LogRetriever {
    source: Arc<dyn LogSource>,
    target_dir: PathBuf,
    watermark: WatermarkStore,
    filter: LogFilter,
    taggers: Vec<LogTagger>,
    folder_lock: Mutex<()>,
}

impl LogRetriever {
    pub fn new(
        source: Arc<dyn LogSource>,
        target_dir: impl Into<PathBuf>,
        filter: LogFilter,
        taggers: Vec<LogTagger>,
    ) -> Self {
        let target_dir = target_dir.into();
        Self {
            source,
            watermark: WatermarkStore::new(&target_dir),
            target_dir,
            filter,
            taggers,
            folder_lock: Mutex::new(()),
        }
    }

    /// The filter every retriever uses: all exported fields are required and
    /// `expressions` are matched against the message.
    pub fn default_filter<S: AsRef<str>>(expressions: &[S]) -> std::result::Result<LogFilter, RuleError> {
        LogFilter::new(&EXPORTED_FIELDS, MESSAGE_FIELD, expressions)
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Fetches entries newer than the stored watermark, stores them as session
    /// files and advances the watermark.
    ///
    /// With `force`, every file in the target directory is removed first, so
    /// all entries are fetched again. Unavailable remote data and a malformed
    /// watermark are not errors; only storage failures are.
    pub async fn retrieve(&self, force: bool) -> Result<()> {
        let _guard = self.folder_lock.lock().await;

        self.prepare_target_dir().await?;
        if force {
            self.clear_logs().await?;
        }

        let last_included = self.watermark.load().await;
        let since = advance_timestamp(&last_included);

        let lines = match self.source.fetch(since, &EXPORTED_FIELDS).await {
            Some(lines) if !lines.is_empty() => lines,
            _ => {
                tracing::info!("No (new) log entries found");
                return Ok(());
            }
        };

        let batch = parse_export(&lines);
        let entries = self.filter.apply(batch.entries);
        let Some(newest) = entries
            .last()
            .and_then(|e| e.get(TIMESTAMP_FIELD))
            .map(str::to_string)
        else {
            tracing::info!("No new entries after filtering");
            return Ok(());
        };

        let mut sessions = group_by_correlation_id(entries);
        let mut fields = batch.fields;
        for tagger in &self.taggers {
            for session in sessions.iter_mut() {
                tagger.tag_entries(&mut session.entries);
            }
            if !fields.iter().any(|f| f == tagger.target_field()) {
                fields.push(tagger.target_field().to_string());
            }
        }

        for name in duplicate_file_names(&sessions) {
            tracing::warn!(
                file = %name,
                "Several sessions map to the same file name, only the last one is kept"
            );
        }

        let header = header_with_message_last(fields);
        for session in &sessions {
            self.store_session(session, &header).await?;
        }

        match parse_timestamp(&newest) {
            Ok(newest) => self.store_watermark(last_included, newest).await?,
            Err(e) => tracing::error!(timestamp = %newest, error = %e, "Not advancing watermark"),
        }

        tracing::info!(sessions = sessions.len(), "Log retrieval finished");
        Ok(())
    }

    async fn prepare_target_dir(&self) -> Result<()> {
        tracing::info!(path = %self.target_dir.display(), "Preparing target directory");
        tokio::fs::create_dir_all(&self.target_dir)
            .await
            .map_err(RetrieveError::io(&self.target_dir))
    }

    async fn clear_logs(&self) -> Result<()> {
        tracing::info!(path = %self.target_dir.display(), "Clearing log directory");
        let mut dir = tokio::fs::read_dir(&self.target_dir)
            .await
            .map_err(RetrieveError::io(&self.target_dir))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(RetrieveError::io(&self.target_dir))?
        {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(RetrieveError::io(&path))?;
            if file_type.is_dir() {
                tracing::warn!(path = %path.display(), "Leaving subdirectory in place");
                continue;
            }
            tokio::fs::remove_file(&path)
                .await
                .map_err(RetrieveError::io(&path))?;
        }
        Ok(())
    }

    async fn store_session(&self, session: &Session, header: &[String]) -> Result<()> {
        let path = self.target_dir.join(session.file_name());
        tracing::info!(
            correlation_id = %session.correlation_id,
            path = %path.display(),
            entries = session.entries.len(),
            "Storing session"
        );
        let content = session.to_csv(header)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(RetrieveError::io(&path))
    }

    async fn store_watermark(&self, previous: DateTime<Utc>, newest: DateTime<Utc>) -> Result<()> {
        if newest < previous {
            tracing::warn!(
                previous = %previous,
                newest = %newest,
                "Batch is older than stored watermark, keeping watermark"
            );
        }
        self.watermark.save(&newest.max(previous)).await
    }
}

impl fmt::Display for LogRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let taggers: Vec<&str> = self.taggers.iter().map(LogTagger::target_field).collect();
        write!(
            f,
            "LogRetriever [target_dir <{}>, log_filter <{}>, log_taggers <{:?}>]",
            self.target_dir.display(),
            self.filter,
            taggers
        )
    }
}
