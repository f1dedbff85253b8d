//! Common types for publishers
//!
//! Errors and delivery counters shared across publisher types.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Metrics
// =============================================================================

/// Delivery counters kept by every publisher
#[derive(Debug, Default)]
pub struct PublisherMetrics {
    /// Payloads acknowledged
    pub published: AtomicU64,

    /// Publish attempts that failed
    pub failed: AtomicU64,

    /// Payload bytes acknowledged
    pub bytes: AtomicU64,
}

impl PublisherMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            published: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    /// Record an acknowledged payload
    #[inline]
    pub fn record_published(&self, bytes: u64) {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed attempt
    #[inline]
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> PublisherMetricsSnapshot {
        PublisherMetricsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of publisher metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublisherMetricsSnapshot {
    pub published: u64,
    pub failed: u64,
    pub bytes: u64,
}

// =============================================================================
// Errors
// =============================================================================

/// Publisher errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP transport failure (connect, send, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Destination answered with a non-success status
    #[error("publish rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Destination answered 2xx without confirming the message
    #[error("invalid publish response: {0}")]
    InvalidResponse(String),

    /// Write failure on a local destination
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempt exceeded the publish timeout
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),

    /// No usable credentials could be obtained
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Publisher was already closed
    #[error("publisher is closed")]
    Closed,

    /// Publisher configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),
}

impl PublishError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether a later attempt can succeed
    ///
    /// Timeouts, transport failures, 5xx and 429 are transient, as is a
    /// failure to obtain a fresh token. Everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => {
                if let Some(status) = e.status() {
                    return is_retryable_status(status.as_u16());
                }
                e.is_timeout() || e.is_connect() || e.is_request()
            }
            Self::Rejected { status, .. } => is_retryable_status(*status),
            Self::Timeout(_) | Self::Auth(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            Self::InvalidResponse(_) | Self::Closed | Self::Config(_) => false,
        }
    }
}

/// Server errors and rate limits
fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
