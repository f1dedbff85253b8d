//! Publish configuration
//!
//! Topic, per-attempt timeout and retry policy for delivering records.

use serde::Deserialize;
use std::time::Duration;

/// Exponential backoff settings
///
/// The delay before retry `n` (0-based) is `base_delay * 2^n`, capped at
/// `max_delay`. `max_retries = 0` fails on the first error.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    /// Default: 3
    pub max_retries: u32,

    /// Delay before the first retry
    /// Default: 500ms
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// Upper bound for any single delay
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Publish configuration
///
/// # Example
///
/// ```toml
/// [publish]
/// topic = "flight-data"
/// timeout = "30s"
/// retry = { max_retries = 3, base_delay = "500ms", max_delay = "30s" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Destination topic
    /// Default: flight-data
    pub topic: String,

    /// Timeout for a single publish attempt
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Retry policy for transient publish failures
    pub retry: RetryConfig,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            topic: "flight-data".into(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PublishConfig::default();
        assert_eq!(config.topic, "flight-data");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_deserialize_inline_retry() {
        let toml = r#"
topic = "adsb"
timeout = "10s"
retry = { max_retries = 0, base_delay = "1s", max_delay = "2s" }
"#;
        let config: PublishConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.topic, "adsb");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(
            config.retry,
            RetryConfig {
                max_retries: 0,
                base_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(2),
            }
        );
    }

    #[test]
    fn test_partial_retry_keeps_defaults() {
        let config: PublishConfig = toml::from_str("retry = { max_retries = 7 }").unwrap();
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.retry.max_delay, Duration::from_secs(30));
    }
}
