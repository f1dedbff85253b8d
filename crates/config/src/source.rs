//! Source configuration
//!
//! Where the feeder's line stream is read from.

use serde::Deserialize;
use std::time::Duration;

/// Feeder connection configuration
///
/// # Example
///
/// ```toml
/// [source]
/// address = "192.168.1.20:10001"
/// read_timeout = "5m"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Feeder `host:port`
    /// Default: 127.0.0.1:10001
    pub address: String,

    /// Connect timeout
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Maximum silence before the read fails; absent = wait forever
    #[serde(with = "humantime_serde")]
    pub read_timeout: Option<Duration>,

    /// Longest accepted line in bytes
    /// Default: 8192
    pub max_line_size: usize,

    /// Read buffer size in bytes
    /// Default: 65536
    pub buffer_size: usize,

    /// Disable Nagle's algorithm
    /// Default: true
    pub nodelay: bool,

    /// TCP keepalive interval; "0s" disables it
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub keepalive: Option<Duration>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:10001".into(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            max_line_size: 8192,
            buffer_size: 64 * 1024,
            nodelay: true,
            keepalive: Some(Duration::from_secs(30)),
        }
    }
}

impl SourceConfig {
    /// Keepalive interval with zero treated as disabled
    pub fn keepalive_interval(&self) -> Option<Duration> {
        self.keepalive.filter(|d| !d.is_zero())
    }
}
