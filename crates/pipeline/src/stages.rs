//! Pipeline stages shared by the sequential and staged drivers
//!
//! - [`read_next`]: pull a line, reconnecting per policy
//! - [`Transform`]: parse + encode, counting rejections
//! - [`publish_with_retry`]: bounded publish with backoff

use std::sync::Arc;
use std::time::Duration;

use flightfeed_protocol::{Bytes, FieldPolicy, LineParser, Rejection, encode};
use flightfeed_sinks::{PublishError, Publisher};
use flightfeed_sources::{LineSource, SourceError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use crate::retry::RetryPolicy;

// =============================================================================
// Read
// =============================================================================

/// Read the next line, reopening the source on end of stream or error
///
/// Returns `Ok(None)` once `cancel` fires. A pending read or backoff is
/// abandoned on cancellation. Bytes of a partially read line are lost with
/// it, so the source must not be read again after cancellation; both
/// drivers stop reading for good once this returns `None`.
pub(crate) async fn read_next(
    source: &mut dyn LineSource,
    reconnect: &RetryPolicy,
    metrics: &PipelineMetrics,
    cancel: &CancellationToken,
) -> Result<Option<String>> {
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            result = source.next_line() => result,
        };

        let cause = match result {
            Ok(Some(line)) => return Ok(Some(line)),
            Ok(None) => {
                info!(source = source.name(), "feed ended");
                None
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "read failed");
                Some(e)
            }
        };

        if !reopen(source, reconnect, metrics, cancel, cause).await? {
            return Ok(None);
        }
    }
}

/// Reconnect with backoff; `Ok(false)` means cancelled while trying
async fn reopen(
    source: &mut dyn LineSource,
    policy: &RetryPolicy,
    metrics: &PipelineMetrics,
    cancel: &CancellationToken,
    mut cause: Option<SourceError>,
) -> Result<bool> {
    let give_up = |cause: Option<SourceError>, attempts: u32| match cause {
        Some(source) => PipelineError::Reader { attempts, source },
        None => PipelineError::EndOfStream { attempts },
    };

    if !source.can_reconnect() {
        return Err(give_up(cause, 0));
    }

    for attempt in 0..policy.max_retries {
        let delay = policy.delay(attempt);
        debug!(
            source = source.name(),
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "reconnecting after delay"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(false),
            _ = tokio::time::sleep(delay) => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(false),
            result = source.reconnect() => result,
        };

        match result {
            Ok(()) => {
                metrics.record_reconnect();
                info!(source = source.name(), attempt = attempt + 1, "reconnected");
                return Ok(true);
            }
            Err(SourceError::ReconnectUnsupported) => return Err(give_up(cause, attempt)),
            Err(e) => {
                warn!(source = source.name(), attempt = attempt + 1, error = %e, "reconnect failed");
                cause = Some(e);
            }
        }
    }

    Err(give_up(cause, policy.max_retries))
}

// =============================================================================
// Transform
// =============================================================================

/// An encoded record ready to publish
#[derive(Debug, Clone)]
pub(crate) struct Encoded {
    /// Record timestamp (for the acknowledgment log)
    pub timestamp: i64,

    /// Aircraft address (for the acknowledgment log)
    pub hex_id: String,

    /// JSON payload
    pub payload: Bytes,
}

/// Parse + encode one line
#[derive(Debug, Clone)]
pub(crate) struct Transform {
    parser: LineParser,
    metrics: Arc<PipelineMetrics>,
}

impl Transform {
    pub(crate) fn new(policy: FieldPolicy, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            parser: LineParser::new(policy),
            metrics,
        }
    }

    /// `Ok(None)` for a discarded line; `Err` only when encoding fails
    pub(crate) fn apply(&self, line: &str) -> Result<Option<Encoded>> {
        let parsed = match self.parser.parse(line) {
            Ok(parsed) => parsed,
            Err(rejection) => {
                match rejection {
                    Rejection::ShapeMismatch { .. } => self.metrics.record_rejected(),
                    Rejection::InvalidField { .. } => self.metrics.record_invalid(),
                }
                trace!(kind = rejection.kind(), reason = %rejection, "line discarded");
                return Ok(None);
            }
        };

        if !parsed.is_clean() {
            self.metrics.record_defaulted(parsed.defaulted.len() as u64);
            debug!(
                hex_id = %parsed.record.hex_id,
                fields = ?parsed.defaulted,
                "unparseable fields set to zero"
            );
        }

        let payload = encode(&parsed.record)?;
        Ok(Some(Encoded {
            timestamp: parsed.record.timestamp,
            hex_id: parsed.record.hex_id,
            payload,
        }))
    }
}

// =============================================================================
// Publish
// =============================================================================

/// Publish with a per-attempt timeout, retrying transient failures
///
/// Retries run to completion even during shutdown so the record in flight
/// is either acknowledged or reported as failed.
pub(crate) async fn publish_with_retry(
    publisher: &dyn Publisher,
    topic: &str,
    payload: Bytes,
    timeout: Duration,
    retry: &RetryPolicy,
    metrics: &PipelineMetrics,
) -> Result<()> {
    let mut attempt = 0;

    loop {
        let attempt_result =
            tokio::time::timeout(timeout, publisher.publish(topic, payload.clone())).await;
        let result = match attempt_result {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(timeout)),
        };

        let error = match result {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        if !error.is_retryable() || attempt >= retry.max_retries {
            metrics.record_publish_failure();
            return Err(PipelineError::Publish {
                attempts: attempt + 1,
                source: error,
            });
        }

        let delay = retry.delay(attempt);
        attempt += 1;
        metrics.record_publish_retry();
        warn!(
            publisher = publisher.name(),
            topic,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "publish failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
