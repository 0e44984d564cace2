//! # LogFileProvider: append records to a plain text file
//!
//! Writes one line per record, `|`-separated:
//!
//! ```text
//! <unix-ms>|<level>|<origin>|<module>|<message>|<tags>
//! <unix-ms>|error|<origin>|<module>|<message>: <error>|<tags>
//! ```
//!
//! The file is opened in `on_begin`. Its path comes from the
//! `logging.provider.<name>.path` setting when present, otherwise from the path
//! passed to [`LogFileProvider::new`]. Output is buffered and flushed at the end of
//! every cycle and on teardown.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::error::HookError;
use crate::providers::{Provider, ProviderFilter};
use crate::records::{ErrorRecord, LogEntry};
use crate::settings::{Settings, provider_key};

/// File provider.
pub struct LogFileProvider {
    name: String,
    default_path: PathBuf,
    filter: ProviderFilter,
    out: Mutex<Option<BufWriter<File>>>,
}

impl LogFileProvider {
    /// Creates a provider named `logfile` writing to `path` unless overridden by settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::named("logfile", path)
    }

    /// Creates a provider with a custom name, so several files can be registered.
    #[must_use]
    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            default_path: path.into(),
            filter: ProviderFilter::new(),
            out: Mutex::new(None),
        }
    }

    /// Replaces the record filter.
    #[must_use]
    pub fn with_filter(mut self, filter: ProviderFilter) -> Self {
        self.filter = filter;
        self
    }

    async fn write_line(&self, line: String) -> Result<(), HookError> {
        let mut out = self.out.lock().await;
        let w = out.as_mut().ok_or_else(|| HookError::fail("log file is not open"))?;
        w.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

fn unix_ms(at: SystemTime) -> u128 {
    at.duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}

fn join_tags(tags: &[std::sync::Arc<str>]) -> String {
    tags.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl Provider for LogFileProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_begin(&self, settings: &Settings) -> Result<(), HookError> {
        let path = settings
            .get_str(&provider_key(&self.name, "path"))
            .map(PathBuf::from)
            .unwrap_or_else(|| self.default_path.clone());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path).await?;
        *self.out.lock().await = Some(BufWriter::new(file));

        tracing::debug!(provider = %self.name, path = %path.display(), "log file opened");
        Ok(())
    }

    async fn on_message(&self, e: &LogEntry) -> Result<(), HookError> {
        self.write_line(format!(
            "{}|{}|{}|{}|{}|{}\n",
            unix_ms(e.at),
            e.level,
            e.origin,
            e.module.as_deref().unwrap_or(""),
            e.message,
            join_tags(&e.tags),
        ))
        .await
    }

    async fn on_error(&self, r: &ErrorRecord) -> Result<(), HookError> {
        self.write_line(format!(
            "{}|error|{}|{}|{}: {}|{}\n",
            unix_ms(r.at),
            r.origin,
            r.module.as_deref().unwrap_or(""),
            r.message,
            r.error,
            join_tags(&r.tags),
        ))
        .await
    }

    async fn on_end(&self) -> Result<(), HookError> {
        if let Some(w) = self.out.lock().await.as_mut() {
            w.flush().await?;
        }
        Ok(())
    }

    async fn on_final(&self) -> Result<(), HookError> {
        if let Some(mut w) = self.out.lock().await.take() {
            w.flush().await?;
            w.shutdown().await?;
        }
        Ok(())
    }

    fn message_applies(&self, entry: &LogEntry) -> bool {
        self.filter.applies_to_entry(entry)
    }

    fn error_applies(&self, record: &ErrorRecord) -> bool {
        self.filter.applies_to_error(record)
    }
}
