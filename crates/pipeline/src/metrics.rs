//! Pipeline metrics
//!
//! Atomic counters for tracking what happened to every line.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics for the pipeline
///
/// Every line read ends up in exactly one of `lines_rejected`,
/// `lines_invalid`, `records_published`, `records_dropped`, or is still in
/// flight.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Lines delivered by the source
    lines_read: AtomicU64,

    /// Lines discarded for having the wrong shape
    lines_rejected: AtomicU64,

    /// Lines discarded for an unparseable field (strict policy)
    lines_invalid: AtomicU64,

    /// Numeric fields replaced by zero
    fields_defaulted: AtomicU64,

    /// Records acknowledged by the sink
    records_published: AtomicU64,

    /// Payload bytes acknowledged by the sink
    bytes_published: AtomicU64,

    /// Publish attempts that were retried
    publish_retries: AtomicU64,

    /// Records whose publish failed for good
    publish_failures: AtomicU64,

    /// Successful source reconnects
    reconnects: AtomicU64,

    /// Queued lines or records abandoned after a fatal failure
    records_dropped: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            lines_read: AtomicU64::new(0),
            lines_rejected: AtomicU64::new(0),
            lines_invalid: AtomicU64::new(0),
            fields_defaulted: AtomicU64::new(0),
            records_published: AtomicU64::new(0),
            bytes_published: AtomicU64::new(0),
            publish_retries: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_line_read(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.lines_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_invalid(&self) {
        self.lines_invalid.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_defaulted(&self, fields: u64) {
        self.fields_defaulted.fetch_add(fields, Ordering::Relaxed);
    }

    /// Record an acknowledged record
    #[inline]
    pub fn record_published(&self, bytes: u64) {
        self.records_published.fetch_add(1, Ordering::Relaxed);
        self.bytes_published.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_publish_retry(&self) {
        self.publish_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self, count: u64) {
        self.records_dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            lines_rejected: self.lines_rejected.load(Ordering::Relaxed),
            lines_invalid: self.lines_invalid.load(Ordering::Relaxed),
            fields_defaulted: self.fields_defaulted.load(Ordering::Relaxed),
            records_published: self.records_published.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
            publish_retries: self.publish_retries.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetricsSnapshot {
    pub lines_read: u64,
    pub lines_rejected: u64,
    pub lines_invalid: u64,
    pub fields_defaulted: u64,
    pub records_published: u64,
    pub bytes_published: u64,
    pub publish_retries: u64,
    pub publish_failures: u64,
    pub reconnects: u64,
    pub records_dropped: u64,
}
