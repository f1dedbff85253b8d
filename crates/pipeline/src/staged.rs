//! Staged pipeline
//!
//! Three tasks joined by bounded channels:
//!
//! ```text
//! [reader] --(seq, line)--> [transform] --(seq, record)--> [publisher]
//!            queue_size                    queue_size
//! ```
//!
//! # Ordering
//!
//! The reader numbers lines in read order. Each channel is FIFO and a single
//! publisher task consumes the last one, so records are published in read
//! order.
//!
//! # Drain
//!
//! On shutdown or reader exit the reader drops its sender; the transform and
//! publisher stages finish everything queued before the publisher is closed.
//! On a fatal encode or publish failure the upstream stages are cancelled and
//! whatever is still queued is counted in `records_dropped`.

use std::sync::Arc;

use flightfeed_sinks::Publisher;
use flightfeed_sources::LineSource;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::driver::DriverState;
use crate::error::{PipelineError, Result, TerminationReason};
use crate::metrics::PipelineMetrics;
use crate::stages::{Encoded, Transform, publish_with_retry, read_next};

/// A raw line tagged with its read position
struct SequencedLine {
    seq: u64,
    line: String,
}

/// An encoded record tagged with its read position
struct SequencedRecord {
    seq: u64,
    record: Encoded,
}

/// Concurrent reader / transform / publisher pipeline
pub struct StagedPipeline {
    /// Configuration
    config: DriverConfig,

    /// Line source; moved into the reader task on `run`
    source: Option<Box<dyn LineSource>>,

    /// Sink
    publisher: Arc<dyn Publisher>,

    /// Metrics (Arc for sharing with the reporter)
    metrics: Arc<PipelineMetrics>,

    /// Lifecycle state
    state: DriverState,
}

impl StagedPipeline {
    /// Create a pipeline in the `Running` state
    pub fn new(
        config: DriverConfig,
        source: Box<dyn LineSource>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            source: Some(source),
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

    /// Run all stages until a fatal failure or until `cancel` fires
    ///
    /// Returns once every stage has exited and the publisher is closed.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        if let DriverState::Terminated(reason) = self.state {
            return Err(PipelineError::AlreadyTerminated(reason));
        }
        let Some(source) = self.source.take() else {
            return Err(PipelineError::AlreadyTerminated(TerminationReason::Shutdown));
        };

        let queue_size = self.config.queue_size.max(1);
        info!(
            source = source.name(),
            publisher = self.publisher.name(),
            topic = %self.config.topic,
            queue_size,
            "staged pipeline running"
        );

        // Cancelled on shutdown or when a downstream stage fails
        let stop = cancel.child_token();
        let (line_tx, line_rx) = mpsc::channel(queue_size);
        let (record_tx, record_rx) = mpsc::channel(queue_size);

        let reader = tokio::spawn(run_reader(
            source,
            self.config.clone(),
            Arc::clone(&self.metrics),
            stop.clone(),
            line_tx,
        ));
        let transform = tokio::spawn(run_transform(
            Transform::new(self.config.field_policy, Arc::clone(&self.metrics)),
            Arc::clone(&self.metrics),
            stop.clone(),
            line_rx,
            record_tx,
        ));
        let publisher = tokio::spawn(run_publisher(
            Arc::clone(&self.publisher),
            self.config.clone(),
            Arc::clone(&self.metrics),
            stop.clone(),
            record_rx,
        ));

        let (reader, transform, publisher) = tokio::join!(reader, transform, publisher);
        let reader = flatten(reader, "reader", TerminationReason::ReaderFailure);
        let transform = flatten(transform, "transform", TerminationReason::EncodeFailure);
        let publisher_result = flatten(publisher, "publisher", TerminationReason::PublishFailure);

        if let Err(e) = self.publisher.close().await {
            warn!(publisher = self.publisher.name(), error = %e, "failed to close publisher");
        }

        // Downstream failures caused any upstream cancellation, so they win
        let result = publisher_result.and(transform).and(reader);

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
            records_dropped = snapshot.records_dropped,
            "staged pipeline stopped"
        );

        result
    }
}

/// Map a stage's join result into its own result
fn flatten(
    joined: std::result::Result<Result<()>, tokio::task::JoinError>,
    stage: &'static str,
    reason: TerminationReason,
) -> Result<()> {
    joined.unwrap_or_else(|e| {
        Err(PipelineError::Stage {
            stage,
            reason,
            message: e.to_string(),
        })
    })
}

// =============================================================================
// Stages
// =============================================================================

async fn run_reader(
    mut source: Box<dyn LineSource>,
    config: DriverConfig,
    metrics: Arc<PipelineMetrics>,
    stop: CancellationToken,
    tx: mpsc::Sender<SequencedLine>,
) -> Result<()> {
    let mut seq = 0u64;

    while let Some(line) = read_next(&mut *source, &config.reconnect, &metrics, &stop).await? {
        metrics.record_line_read();

        if tx.send(SequencedLine { seq, line }).await.is_err() {
            // Downstream stopped after a failure
            metrics.record_dropped(1);
            break;
        }
        seq += 1;
    }

    debug!(lines = seq, "reader stage finished");
    Ok(())
}

async fn run_transform(
    transform: Transform,
    metrics: Arc<PipelineMetrics>,
    stop: CancellationToken,
    mut rx: mpsc::Receiver<SequencedLine>,
    tx: mpsc::Sender<SequencedRecord>,
) -> Result<()> {
    while let Some(SequencedLine { seq, line }) = rx.recv().await {
        let record = match transform.apply(&line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(e) => {
                stop.cancel();
                metrics.record_dropped(1 + drain(&mut rx));
                return Err(e);
            }
        };

        if tx.send(SequencedRecord { seq, record }).await.is_err() {
            metrics.record_dropped(1 + drain(&mut rx));
            break;
        }
    }

    debug!("transform stage finished");
    Ok(())
}

async fn run_publisher(
    publisher: Arc<dyn Publisher>,
    config: DriverConfig,
    metrics: Arc<PipelineMetrics>,
    stop: CancellationToken,
    mut rx: mpsc::Receiver<SequencedRecord>,
) -> Result<()> {
    let mut last_seq = None;

    while let Some(SequencedRecord { seq, record }) = rx.recv().await {
        debug_assert!(last_seq.is_none_or(|last| seq > last), "records out of order");
        last_seq = Some(seq);

        let bytes = record.payload.len() as u64;
        let result = publish_with_retry(
            &*publisher,
            &config.topic,
            record.payload,
            config.publish_timeout,
            &config.publish_retry,
            &metrics,
        )
        .await;

        if let Err(e) = result {
            stop.cancel();
            metrics.record_dropped(drain(&mut rx));
            return Err(e);
        }

        metrics.record_published(bytes);
        info!(
            topic = %config.topic,
            timestamp = record.timestamp,
            hex_id = %record.hex_id,
            seq,
            "record published"
        );
    }

    debug!("publisher stage finished");
    Ok(())
}

/// Close a receiver and count what was still queued
fn drain<T>(rx: &mut mpsc::Receiver<T>) -> u64 {
    rx.close();
    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    count
}

#[cfg(test)]
#[path = "staged_test.rs"]
mod staged_test;
