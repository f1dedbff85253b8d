//! Publisher trait definition

use async_trait::async_trait;
use bytes::Bytes;

use crate::common::{PublishError, PublisherMetricsSnapshot};

/// Delivers payloads to a named topic
///
/// `publish` resolves only after the destination confirms receipt, so a
/// caller that awaits each publish never has more than one record in flight.
/// Implementations are shared behind `Arc` and must tolerate concurrent use.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publisher name for logging
    fn name(&self) -> &str;

    /// Publish one payload and wait for the acknowledgment
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError>;

    /// Flush and release resources
    async fn close(&self) -> Result<(), PublishError> {
        Ok(())
    }

    /// Current delivery counters
    fn metrics(&self) -> PublisherMetricsSnapshot {
        PublisherMetricsSnapshot::default()
    }
}
