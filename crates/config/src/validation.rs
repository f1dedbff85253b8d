//! Configuration validation
//!
//! Checks values serde cannot:
//! - Source address has a port, line limits are sane
//! - Active sink has its required fields
//! - Topic is set
//! - Queue size and retry delays are usable
//! - Metrics interval is non-zero

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::publish::RetryConfig;
use crate::sink::SinkConfig;

/// Smallest accepted `max_line_size`; a valid feeder line is ~100 bytes
const MIN_LINE_SIZE: usize = 64;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_source(config)?;
    validate_sink(config)?;
    validate_publish(config)?;
    validate_pipeline(config)?;
    config.metrics.validate()?;
    Ok(())
}

fn validate_source(config: &Config) -> Result<()> {
    let source = &config.source;

    let port = source
        .address
        .rsplit_once(':')
        .map(|(host, port)| (host.trim(), port))
        .filter(|(host, _)| !host.is_empty())
        .map(|(_, port)| port);

    match port {
        Some(port) if port.parse::<u16>().is_ok_and(|p| p > 0) => {}
        _ => {
            return Err(ConfigError::invalid_value(
                "source",
                "address",
                format!("'{}' must be host:port", source.address),
            ));
        }
    }

    if source.max_line_size < MIN_LINE_SIZE {
        return Err(ConfigError::invalid_value(
            "source",
            "max_line_size",
            format!("must be at least {MIN_LINE_SIZE}"),
        ));
    }

    if source.buffer_size == 0 {
        return Err(ConfigError::invalid_value(
            "source",
            "buffer_size",
            "must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_sink(config: &Config) -> Result<()> {
    match &config.sink {
        SinkConfig::PubSub(pubsub) => {
            if pubsub.project.trim().is_empty() {
                return Err(ConfigError::missing_field("sink", "project"));
            }
            if pubsub.endpoint.trim().is_empty() {
                return Err(ConfigError::missing_field("sink", "endpoint"));
            }
        }
        SinkConfig::File(file) => {
            if file.path.as_os_str().is_empty() {
                return Err(ConfigError::missing_field("sink", "path"));
            }
        }
        SinkConfig::Stdout(_) | SinkConfig::Null => {}
    }
    Ok(())
}

fn validate_publish(config: &Config) -> Result<()> {
    if config.publish.topic.trim().is_empty() {
        return Err(ConfigError::missing_field("publish", "topic"));
    }
    validate_retry("publish", &config.publish.retry)
}

fn validate_pipeline(config: &Config) -> Result<()> {
    if config.pipeline.queue_size == 0 {
        return Err(ConfigError::invalid_value(
            "pipeline",
            "queue_size",
            "must be greater than 0",
        ));
    }
    validate_retry("pipeline", &config.pipeline.reconnect)
}

fn validate_retry(section: &'static str, retry: &RetryConfig) -> Result<()> {
    if retry.base_delay > retry.max_delay {
        return Err(ConfigError::invalid_value(
            section,
            "retry",
            format!(
                "base_delay {:?} exceeds max_delay {:?}",
                retry.base_delay, retry.max_delay
            ),
        ));
    }
    Ok(())
}
