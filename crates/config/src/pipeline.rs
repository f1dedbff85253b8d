//! Pipeline configuration
//!
//! Execution mode, field policy and reader reconnect policy.

use serde::Deserialize;
use std::time::Duration;

use crate::publish::RetryConfig;

/// How the pipeline executes
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// One task, each record published before the next read (default)
    #[default]
    Sequential,
    /// Reader, transform and publisher tasks joined by bounded queues
    Staged,
}

/// What to do with an unparseable numeric field
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvalidFieldPolicy {
    /// Substitute zero and keep the record (default)
    #[default]
    Zero,
    /// Discard the whole line
    Reject,
}

/// Pipeline configuration
///
/// # Example
///
/// ```toml
/// [pipeline]
/// mode = "staged"
/// queue_size = 1024
/// field_policy = "zero"
/// reconnect = { max_retries = 3, base_delay = "1s", max_delay = "30s" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Execution mode
    /// Default: sequential
    pub mode: PipelineMode,

    /// Capacity of each inter-stage queue (staged mode)
    /// Default: 1024
    pub queue_size: usize,

    /// Handling of unparseable numeric fields
    /// Default: zero
    pub field_policy: InvalidFieldPolicy,

    /// Reconnect policy when the feed ends or fails
    pub reconnect: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::Sequential,
            queue_size: 1024,
            field_policy: InvalidFieldPolicy::Zero,
            reconnect: RetryConfig {
                max_retries: 3,
                base_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.mode, PipelineMode::Sequential);
        assert_eq!(config.queue_size, 1024);
        assert_eq!(config.field_policy, InvalidFieldPolicy::Zero);
        assert_eq!(config.reconnect.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
mode = "staged"
queue_size = 16
field_policy = "reject"
reconnect = { max_retries = 10, base_delay = "2s", max_delay = "1m" }
"#;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.mode, PipelineMode::Staged);
        assert_eq!(config.queue_size, 16);
        assert_eq!(config.field_policy, InvalidFieldPolicy::Reject);
        assert_eq!(config.reconnect.max_retries, 10);
        assert_eq!(config.reconnect.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("mode = \"parallel\"");
        assert!(result.is_err());
    }
}
