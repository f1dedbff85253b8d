//! Driver configuration

use std::time::Duration;

use flightfeed_config::{Config, InvalidFieldPolicy};
use flightfeed_protocol::FieldPolicy;

use crate::retry::RetryPolicy;

/// Everything the pipeline needs besides its source and publisher
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Destination topic
    pub topic: String,

    /// Timeout for one publish attempt
    pub publish_timeout: Duration,

    /// Retry policy for transient publish failures
    pub publish_retry: RetryPolicy,

    /// Reconnect policy when the feed ends or fails
    pub reconnect: RetryPolicy,

    /// Handling of unparseable numeric fields
    pub field_policy: FieldPolicy,

    /// Inter-stage queue capacity (staged mode)
    pub queue_size: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            topic: "flight-data".into(),
            publish_timeout: Duration::from_secs(30),
            publish_retry: RetryPolicy::default(),
            reconnect: RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30)),
            field_policy: FieldPolicy::ZeroOnParseFailure,
            queue_size: 1024,
        }
    }
}

impl DriverConfig {
    /// Build from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let field_policy = match config.pipeline.field_policy {
            InvalidFieldPolicy::Zero => FieldPolicy::ZeroOnParseFailure,
            InvalidFieldPolicy::Reject => FieldPolicy::RejectOnParseFailure,
        };

        Self {
            topic: config.publish.topic.clone(),
            publish_timeout: config.publish.timeout,
            publish_retry: RetryPolicy::from(&config.publish.retry),
            reconnect: RetryPolicy::from(&config.pipeline.reconnect),
            field_policy,
            queue_size: config.pipeline.queue_size,
        }
    }

    /// Config with retries disabled everywhere
    pub fn fail_fast(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            publish_retry: RetryPolicy::none(),
            reconnect: RetryPolicy::none(),
            ..Default::default()
        }
    }
}
