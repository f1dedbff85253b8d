//! Flightfeed - Sinks
//!
//! Publishers that deliver encoded position records to a message bus.
//!
//! # Architecture
//!
//! The pipeline hands each encoded record to a [`Publisher`] and awaits the
//! acknowledgment before moving on. A publisher returns only once the
//! destination has durably accepted the payload.
//!
//! ```text
//! [Pipeline] --(topic, Bytes)--> [Publisher] --> [Destination]
//! ```
//!
//! # Available Publishers
//!
//! | Publisher | Purpose | Acknowledgment |
//! |-----------|---------|----------------|
//! | `pubsub` | Google Cloud Pub/Sub REST | 2xx with message id |
//! | `stdout` | Debug output, piping | line flushed |
//! | `file` | JSON lines on disk | write flushed (optionally fsynced) |
//! | `null` | Benchmarking, tests | immediate |
//!
//! # Example
//!
//! ```ignore
//! use flightfeed_sinks::{Publisher, PubSubConfig, PubSubPublisher};
//!
//! let publisher = PubSubPublisher::connect(PubSubConfig::with_project("my-project")).await?;
//! publisher.publish("flight-data", payload).await?;
//! publisher.close().await?;
//! ```

/// Null publisher - acknowledges and discards
pub mod null;

/// Stdout publisher - one payload per line
pub mod stdout;

/// File publisher - appends JSON lines
pub mod file;

/// Pub/Sub publisher - REST `topics.publish`
pub mod pubsub;

/// Common types shared by all publishers (errors, metrics)
mod common;

/// Publisher trait
mod traits;

pub use common::{PublishError, PublisherMetrics, PublisherMetricsSnapshot};
pub use file::{FilePublisher, FilePublisherConfig};
pub use null::NullPublisher;
pub use pubsub::{PubSubConfig, PubSubPublisher, TokenSource};
pub use stdout::{StdoutPublisher, StdoutPublisherConfig};
pub use traits::Publisher;
