//! Flightfeed - Sources
//!
//! Line-framed readers that turn a byte stream into feeder lines for the
//! pipeline.
//!
//! # Available Sources
//!
//! - **TCP** - Dials the feeder's `host:port`, reconnectable
//! - **LineReader** - Any `AsyncBufRead` (files, stdin, in-memory buffers)
//!
//! # Design Principles
//!
//! - **Bounded buffering**: lines longer than `max_line_size` are skipped,
//!   never buffered whole
//! - **Framing survives garbage**: an oversized or non-UTF-8 line never
//!   desynchronises the next one
//! - **Trait seam**: the pipeline only sees [`LineSource`]
//!
//! # Example
//!
//! ```ignore
//! use flightfeed_sources::{LineSource, TcpLineSource, TcpSourceConfig};
//!
//! let config = TcpSourceConfig::with_address("127.0.0.1:10001");
//! let mut source = TcpLineSource::connect(config).await?;
//!
//! while let Some(line) = source.next_line().await? {
//!     println!("{line}");
//! }
//! ```

mod common;
mod error;
mod reader;
mod tcp;
mod traits;

pub use common::{SourceMetrics, SourceMetricsSnapshot};
pub use error::SourceError;
pub use reader::{DEFAULT_MAX_LINE_SIZE, LineReader};
pub use tcp::{TcpLineSource, TcpSourceConfig};
pub use traits::LineSource;

#[cfg(test)]
mod reader_test;
#[cfg(test)]
mod tcp_test;
