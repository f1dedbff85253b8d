//! Common types for sources
//!
//! Metrics shared by every line source.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics shared by all source types
///
/// Survives reconnects: a reconnecting source keeps the same instance.
#[derive(Debug, Default)]
pub struct SourceMetrics {
    /// Total connections opened
    pub connections_total: AtomicU64,

    /// Complete lines delivered
    pub lines_read: AtomicU64,

    /// Lines skipped for exceeding the size limit
    pub lines_oversized: AtomicU64,

    /// Total bytes consumed, terminators included
    pub bytes_read: AtomicU64,

    /// Read errors (resets during shutdown excluded)
    pub errors: AtomicU64,
}

impl SourceMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            lines_read: AtomicU64::new(0),
            lines_oversized: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Record a new connection
    #[inline]
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a delivered line
    #[inline]
    pub fn line_read(&self, bytes: u64) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a skipped oversized line
    #[inline]
    pub fn line_oversized(&self, bytes: u64) {
        self.lines_oversized.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record error
    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> SourceMetricsSnapshot {
        SourceMetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            lines_read: self.lines_read.load(Ordering::Relaxed),
            lines_oversized: self.lines_oversized.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of source metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceMetricsSnapshot {
    pub connections_total: u64,
    pub lines_read: u64,
    pub lines_oversized: u64,
    pub bytes_read: u64,
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_line_tracking() {
        let metrics = SourceMetrics::new();

        metrics.line_read(100);
        metrics.line_read(50);
        metrics.line_oversized(9000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lines_read, 2);
        assert_eq!(snapshot.lines_oversized, 1);
        assert_eq!(snapshot.bytes_read, 9150);
    }

    #[test]
    fn test_metrics_connection_and_errors() {
        let metrics = SourceMetrics::new();

        metrics.connection_opened();
        metrics.connection_opened();
        metrics.error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_total, 2);
        assert_eq!(snapshot.errors, 1);
    }
}
