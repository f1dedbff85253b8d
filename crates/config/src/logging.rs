//! `[log]` section
//!
//! flightfeed logs to stderr only. stdout belongs to the stdout sink and to
//! `convert`, so anything written there would corrupt the record stream.
//!
//! The level applies to flightfeed's own crates. The HTTP and auth stack
//! under the Pub/Sub publisher logs every pooled connection and token fetch
//! at debug, so it stays at `warn` unless the level is `trace`.

use serde::Deserialize;

/// Crates whose debug output is connection noise rather than feed activity
const HTTP_STACK: &[&str] = &["hyper", "hyper_util", "h2", "rustls", "reqwest", "gcp_auth"];

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every line read and record published
    Trace,
    /// Reconnects, retries and rejected lines
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `EnvFilter` directive for this level
    ///
    /// ```
    /// use flightfeed_config::LogLevel;
    ///
    /// assert!(LogLevel::Debug.directive().starts_with("debug,hyper=warn"));
    /// assert_eq!(LogLevel::Trace.directive(), "trace");
    /// ```
    pub fn directive(&self) -> String {
        match self {
            Self::Debug | Self::Info => {
                let mut directive = self.as_str().to_string();
                for target in HTTP_STACK {
                    directive.push_str(&format!(",{target}=warn"));
                }
                directive
            }
            Self::Trace | Self::Warn | Self::Error => self.as_str().to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Console lines with targets, for a terminal or journald
    #[default]
    Console,
    /// One JSON object per event, for a log shipper
    Json,
}

/// Logging configuration
///
/// ```toml
/// [log]
/// level = "debug"   # see reconnects and rejected feeder lines
/// format = "json"
/// ```
///
/// `--log-level` on the command line replaces `level`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Default: console
    pub format: LogFormat,
}
