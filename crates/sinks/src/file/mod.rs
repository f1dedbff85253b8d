//! File publisher - appends JSON lines
//!
//! Each payload is appended as one line with a single `write_all` on a
//! blocking task. The task runs to completion even if the publish future is
//! dropped (for example by a publish timeout), so a line is never torn. A
//! retry after such a timeout can append the same line twice; lines are
//! whole either way. With `sync = true` every line is also `fsync`ed before
//! acknowledging.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::common::{PublishError, PublisherMetrics, PublisherMetricsSnapshot};
use crate::traits::Publisher;

/// Configuration for file publisher
#[derive(Debug, Clone)]
pub struct FilePublisherConfig {
    /// Output file (created if missing, appended otherwise)
    pub path: PathBuf,

    /// fsync every publish before acknowledging
    pub sync: bool,
}

impl FilePublisherConfig {
    /// Create config for a path with sync disabled
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync: false,
        }
    }
}

/// Publisher appending payload lines to a file
pub struct FilePublisher {
    /// Configuration
    config: FilePublisherConfig,

    /// Open file; `None` once closed. Shared with in-flight write tasks.
    file: Arc<Mutex<Option<File>>>,

    /// Metrics
    metrics: Arc<PublisherMetrics>,
}

impl FilePublisher {
    /// Open (or create) the output file
    pub async fn open(config: FilePublisherConfig) -> Result<Self, PublishError> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path = config.path.clone();
        let file = run_blocking(move || {
            OpenOptions::new().create(true).append(true).open(path)
        })
        .await?;

        tracing::info!(
            path = %config.path.display(),
            sync = config.sync,
            "file publisher opened"
        );

        Ok(Self {
            config,
            file: Arc::new(Mutex::new(Some(file))),
            metrics: Arc::new(PublisherMetrics::new()),
        })
    }

    /// Get the output path
    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    async fn append(&self, payload: &[u8]) -> Result<(), PublishError> {
        let mut line = Vec::with_capacity(payload.len() + 1);
        line.extend_from_slice(payload);
        line.push(b'\n');

        let file = Arc::clone(&self.file);
        let sync = self.config.sync;
        run_blocking(move || {
            let mut guard = lock(&file);
            let Some(file) = guard.as_mut() else {
                return Ok(Err(PublishError::Closed));
            };
            file.write_all(&line)?;
            if sync {
                file.sync_data()?;
            }
            Ok(Ok(()))
        })
        .await?
    }
}

/// Lock the file, recovering from a panicked writer
fn lock(file: &Mutex<Option<File>>) -> std::sync::MutexGuard<'_, Option<File>> {
    file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run file I/O on the blocking pool
async fn run_blocking<T, F>(f: F) -> Result<T, PublishError>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => Ok(result?),
        Err(e) => Err(PublishError::Io(std::io::Error::other(e))),
    }
}

#[async_trait]
impl Publisher for FilePublisher {
    fn name(&self) -> &str {
        "file"
    }

    async fn publish(&self, _topic: &str, payload: Bytes) -> Result<(), PublishError> {
        match self.append(&payload).await {
            Ok(()) => {
                self.metrics.record_published(payload.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failed();
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<(), PublishError> {
        let file = Arc::clone(&self.file);
        let closed = run_blocking(move || match lock(&file).take() {
            Some(file) => file.sync_all().map(|()| true),
            None => Ok(false),
        })
        .await?;
        if !closed {
            return Ok(());
        }

        tracing::info!(
            path = %self.config.path.display(),
            published = self.metrics.snapshot().published,
            "file publisher closed"
        );
        Ok(())
    }

    fn metrics(&self) -> PublisherMetricsSnapshot {
        self.metrics.snapshot()
    }
}
