//! Stdout publisher - one payload per line
//!
//! Writes each payload to stdout followed by a newline and flushes before
//! acknowledging, so output can be piped into other tools record by record.
//!
//! # Example Output
//!
//! ```text
//! {"timestamp":1526120887,"hexId":"4CC270","ident":"ICE470",...}
//! flight-data {"timestamp":1526120888,"hexId":"3C6586","ident":"DLH4AK",...}
//! ```
//!
//! The second form is produced with `include_topic = true`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::common::{PublishError, PublisherMetrics, PublisherMetricsSnapshot};
use crate::traits::Publisher;

/// Configuration for stdout publisher
#[derive(Debug, Clone, Default)]
pub struct StdoutPublisherConfig {
    /// Prefix each line with the topic name
    pub include_topic: bool,
}

/// Publisher writing payload lines to stdout (or any async writer)
pub struct StdoutPublisher<W = Stdout> {
    /// Configuration
    config: StdoutPublisherConfig,

    /// Output, serialised so concurrent publishes never interleave
    writer: Mutex<W>,

    /// Metrics
    metrics: Arc<PublisherMetrics>,
}

impl StdoutPublisher<Stdout> {
    /// Create a publisher on process stdout
    pub fn new(config: StdoutPublisherConfig) -> Self {
        Self::with_writer(config, tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> StdoutPublisher<W> {
    /// Create a publisher on an arbitrary writer
    pub fn with_writer(config: StdoutPublisherConfig, writer: W) -> Self {
        Self {
            config,
            writer: Mutex::new(writer),
            metrics: Arc::new(PublisherMetrics::new()),
        }
    }

    /// Consume the publisher and return the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn write_line(&self, topic: &str, payload: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        if self.config.include_topic {
            writer.write_all(topic.as_bytes()).await?;
            writer.write_all(b" ").await?;
        }
        writer.write_all(payload).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Publisher for StdoutPublisher<W> {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        match self.write_line(topic, &payload).await {
            Ok(()) => {
                self.metrics.record_published(payload.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failed();
                Err(PublishError::Io(e))
            }
        }
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }

    fn metrics(&self) -> PublisherMetricsSnapshot {
        self.metrics.snapshot()
    }
}
