//! Null publisher - acknowledges and discards
//!
//! Used for benchmarking the pipeline without any I/O overhead and for
//! exercising the driver in tests.
//!
//! # Example
//!
//! ```ignore
//! use flightfeed_sinks::{NullPublisher, Publisher};
//!
//! let publisher = NullPublisher::new();
//! publisher.publish("flight-data", payload).await?;
//! assert_eq!(publisher.metrics().published, 1);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::common::{PublishError, PublisherMetrics, PublisherMetricsSnapshot};
use crate::traits::Publisher;

/// Publisher that acknowledges every payload immediately
#[derive(Debug, Default)]
pub struct NullPublisher {
    /// Metrics (Arc for sharing with reporters)
    metrics: Arc<PublisherMetrics>,
}

impl NullPublisher {
    /// Create a new null publisher
    pub fn new() -> Self {
        Self::default()
    }

    /// Get shared metrics
    pub fn metrics_handle(&self) -> Arc<PublisherMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[async_trait]
impl Publisher for NullPublisher {
    fn name(&self) -> &str {
        "null"
    }

    async fn publish(&self, _topic: &str, payload: Bytes) -> Result<(), PublishError> {
        self.metrics.record_published(payload.len() as u64);
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            publisher = "null",
            published = snapshot.published,
            bytes = snapshot.bytes,
            "null publisher closed"
        );
        Ok(())
    }

    fn metrics(&self) -> PublisherMetricsSnapshot {
        self.metrics.snapshot()
    }
}
