//! Flightfeed - Pipeline
//!
//! Moves feeder lines from a [`LineSource`] to a [`Publisher`]:
//!
//! ```text
//! [LineSource] ──line──→ [parse] ──record──→ [encode] ──JSON──→ [Publisher]
//!      │                    │                    │                   │
//!  reconnect           count + skip           fatal            retry, then
//!  with backoff        bad lines                                fatal
//! ```
//!
//! # Modes
//!
//! - [`Driver`]: sequential; each record is acknowledged before the next
//!   read, so the feed is backpressured by the sink
//! - [`StagedPipeline`]: reader, transform and publisher tasks joined by
//!   bounded queues, publishing in read order
//!
//! Both stop with a [`TerminationReason`]; only reader, encode and publish
//! failures surface as [`PipelineError`].
//!
//! [`LineSource`]: flightfeed_sources::LineSource
//! [`Publisher`]: flightfeed_sinks::Publisher

mod config;
mod driver;
mod error;
mod metrics;
mod reporter;
mod retry;
mod staged;
mod stages;

#[cfg(test)]
mod test_util;

pub use config::DriverConfig;
pub use driver::{Driver, DriverState};
pub use error::{PipelineError, Result, TerminationReason};
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};
pub use reporter::{MetricsReport, MetricsReporter};
pub use retry::RetryPolicy;
pub use staged::StagedPipeline;
