//! Sequential pipeline driver
//!
//! One task reads a line, parses and encodes it, publishes it and awaits the
//! acknowledgment before reading the next. The pipeline therefore never
//! runs ahead of the sink.
//!
//! # State Machine
//!
//! ```text
//! Running ──┬── reader gives up ──→ Terminated(ReaderFailure)
//!           ├── encode fails ─────→ Terminated(EncodeFailure)
//!           ├── publish gives up ─→ Terminated(PublishFailure)
//!           └── cancelled ────────→ Terminated(Shutdown)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut driver = Driver::new(DriverConfig::default(), Box::new(source), publisher);
//! driver.run(cancel).await?;
//! ```

use std::sync::Arc;

use flightfeed_sinks::Publisher;
use flightfeed_sources::LineSource;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::DriverConfig;
use crate::error::{PipelineError, Result, TerminationReason};
use crate::metrics::PipelineMetrics;
use crate::stages::{Transform, publish_with_retry, read_next};

/// Lifecycle state of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Constructed or running
    Running,
    /// Stopped; will not run again
    Terminated(TerminationReason),
}

/// Sequential read → parse → encode → publish loop
pub struct Driver {
    /// Configuration
    config: DriverConfig,

    /// Line source
    source: Box<dyn LineSource>,

    /// Sink
    publisher: Arc<dyn Publisher>,

    /// Metrics (Arc for sharing with the reporter)
    metrics: Arc<PipelineMetrics>,

    /// Lifecycle state
    state: DriverState,
}

impl Driver {
    /// Create a driver in the `Running` state
    pub fn new(
        config: DriverConfig,
        source: Box<dyn LineSource>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            source,
            publisher,
            metrics: Arc::new(PipelineMetrics::new()),
            state: DriverState::Running,
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Run until a fatal failure or until `cancel` fires
    ///
    /// A publish in progress when `cancel` fires is completed first. The
    /// publisher is closed before returning. Returns `Ok(())` on graceful
    /// shutdown.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        if let DriverState::Terminated(reason) = self.state {
            return Err(PipelineError::AlreadyTerminated(reason));
        }

        info!(
            source = self.source.name(),
            publisher = self.publisher.name(),
            topic = %self.config.topic,
            "pipeline running"
        );

        let result = self.run_loop(&cancel).await;

        if let Err(e) = self.publisher.close().await {
            warn!(publisher = self.publisher.name(), error = %e, "failed to close publisher");
        }

        let reason = match &result {
            Ok(()) => TerminationReason::Shutdown,
            Err(e) => e.reason(),
        };
        self.state = DriverState::Terminated(reason);

        let snapshot = self.metrics.snapshot();
        info!(
            reason = %reason,
            lines_read = snapshot.lines_read,
            records_published = snapshot.records_published,
            "pipeline stopped"
        );

        result
    }

    async fn run_loop(&mut self, cancel: &CancellationToken) -> Result<()> {
        let transform = Transform::new(self.config.field_policy, Arc::clone(&self.metrics));

        loop {
            let Some(line) =
                read_next(&mut *self.source, &self.config.reconnect, &self.metrics, cancel).await?
            else {
                return Ok(());
            };
            self.metrics.record_line_read();

            let Some(record) = transform.apply(&line)? else {
                continue;
            };

            let bytes = record.payload.len() as u64;
            publish_with_retry(
                &*self.publisher,
                &self.config.topic,
                record.payload,
                self.config.publish_timeout,
                &self.config.publish_retry,
                &self.metrics,
            )
            .await?;

            self.metrics.record_published(bytes);
            info!(
                topic = %self.config.topic,
                timestamp = record.timestamp,
                hex_id = %record.hex_id,
                "record published"
            );
        }
    }
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;
