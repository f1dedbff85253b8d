//! `[metrics]` section
//!
//! While `serve` runs, the reporter logs the pipeline, source and publisher
//! counters every `interval`, plus a final report at shutdown. `convert`
//! prints its own summary and ignores this section.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// How a report is rendered into the log
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// `pipeline: read=.. published=..` lines
    #[default]
    Human,
    /// The whole report as one JSON object
    Json,
}

/// Periodic counter reports
///
/// ```toml
/// [metrics]
/// interval = "15s"
/// format = "json"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Default: true
    pub enabled: bool,

    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Default: human
    pub format: MetricsFormat,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            format: MetricsFormat::Human,
        }
    }
}

impl MetricsConfig {
    /// Reject a zero interval while reporting is on; the reporter's ticker
    /// cannot run with one
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "metrics",
                "interval",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}
