//! Bounded line reader
//!
//! Newline framing over any `AsyncBufRead`. Each line is accumulated into a
//! reused buffer capped at `max_line_size`; a longer line is consumed up to
//! its terminator and skipped so the next line starts cleanly.
//!
//! An unterminated tail at end of stream is dropped by default, since on a
//! live connection it is a line cut off mid-write. Finished inputs such as
//! captured files opt in to keeping it with [`LineReader::with_trailing_line`].

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::common::SourceMetrics;
use crate::error::SourceError;
use crate::traits::LineSource;

/// Default maximum line size (8KB). Feeder lines are ~150 bytes.
pub const DEFAULT_MAX_LINE_SIZE: usize = 8192;

/// Line reader over a buffered byte stream
pub struct LineReader<R> {
    /// Underlying buffered reader
    reader: R,

    /// Line buffer (reused across reads)
    buf: Vec<u8>,

    /// Longest line kept, terminator excluded
    max_line_size: usize,

    /// Name for logging
    name: String,

    /// Deliver an unterminated final line instead of discarding it
    trailing_line: bool,

    /// Metrics (shared with the owning source)
    metrics: Arc<SourceMetrics>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Create a reader with its own metrics
    pub fn new(reader: R, max_line_size: usize) -> Self {
        Self::with_metrics(reader, max_line_size, Arc::new(SourceMetrics::new()))
    }

    /// Create a reader that records into existing metrics
    pub fn with_metrics(reader: R, max_line_size: usize, metrics: Arc<SourceMetrics>) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(max_line_size.min(DEFAULT_MAX_LINE_SIZE)),
            max_line_size,
            name: "reader".into(),
            trailing_line: false,
            metrics,
        }
    }

    /// Set the name used in logs
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Deliver an unterminated final line at end of stream
    #[must_use]
    pub fn with_trailing_line(mut self, enabled: bool) -> Self {
        self.trailing_line = enabled;
        self
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<SourceMetrics> {
        &self.metrics
    }

    /// Read the next complete line
    ///
    /// Strips `\n` and a preceding `\r`. Oversized lines are skipped.
    /// Unterminated bytes at end of stream are discarded unless
    /// `with_trailing_line(true)` was set.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            match read_bounded_line(&mut self.reader, &mut self.buf, self.max_line_size).await? {
                ReadLineResult::Line(bytes_read) => {
                    self.metrics.line_read(bytes_read as u64);
                    return Ok(Some(self.take_line()));
                }
                ReadLineResult::TooLong(bytes_read) => {
                    self.metrics.line_oversized(bytes_read as u64);
                    tracing::debug!(
                        source = %self.name,
                        bytes = bytes_read,
                        max = self.max_line_size,
                        "line too long, skipped"
                    );
                }
                ReadLineResult::Eof { partial } if partial > 0 && self.trailing_line => {
                    // The tail is buffered only if it fit
                    if self.buf.len() == partial {
                        self.metrics.line_read(partial as u64);
                        return Ok(Some(self.take_line()));
                    }
                    self.metrics.line_oversized(partial as u64);
                    tracing::debug!(
                        source = %self.name,
                        bytes = partial,
                        max = self.max_line_size,
                        "unterminated line too long, skipped"
                    );
                    return Ok(None);
                }
                ReadLineResult::Eof { partial } => {
                    if partial > 0 {
                        tracing::debug!(
                            source = %self.name,
                            bytes = partial,
                            "discarding unterminated line at end of stream"
                        );
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Buffered line without a trailing `\r`
    fn take_line(&self) -> String {
        let mut line = self.buf.as_slice();
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        String::from_utf8_lossy(line).into_owned()
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for LineReader<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        self.read_line().await.map_err(SourceError::Io)
    }
}

// =============================================================================
// Bounded Line Reading
// =============================================================================

/// Result of reading a bounded line
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadLineResult {
    /// Line is in the buffer (byte count includes the newline)
    Line(usize),
    /// Line exceeded max size and was consumed/discarded
    TooLong(usize),
    /// End of stream; `partial` unterminated bytes were consumed and are
    /// left in the buffer if they fit
    Eof { partial: usize },
}

/// Read one line into `buf` with bounded memory allocation
///
/// - Reads until newline; the newline is consumed but not stored
/// - Past `max_size` bytes, keeps consuming until the newline without storing
pub(crate) async fn read_bounded_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_size: usize,
) -> io::Result<ReadLineResult> {
    buf.clear();

    let mut total_bytes = 0;
    let mut exceeded_limit = false;

    loop {
        let available = reader.fill_buf().await?;

        if available.is_empty() {
            return Ok(ReadLineResult::Eof {
                partial: total_bytes,
            });
        }

        let (content_len, consume_len, done) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos, pos + 1, true),
            None => (available.len(), available.len(), false),
        };

        if !exceeded_limit {
            if buf.len() + content_len <= max_size {
                buf.extend_from_slice(&available[..content_len]);
            } else {
                exceeded_limit = true;
                buf.clear();
            }
        }

        total_bytes += consume_len;
        reader.consume(consume_len);

        if done {
            return Ok(if exceeded_limit {
                ReadLineResult::TooLong(total_bytes)
            } else {
                ReadLineResult::Line(total_bytes)
            });
        }
    }
}
