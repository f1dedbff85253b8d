//! Sink configuration types
//!
//! Which message bus the encoded records are published to. Exactly one sink
//! is active; the variant is selected by `type`.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the active sink
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "pubsub"
/// project = "my-project"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Google Cloud Pub/Sub
    #[serde(rename = "pubsub")]
    PubSub(PubSubSinkConfig),

    /// Stdout, one JSON document per line (default)
    Stdout(StdoutSinkConfig),

    /// Append JSON lines to a file
    File(FileSinkConfig),

    /// Acknowledge and discard
    Null,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Stdout(StdoutSinkConfig::default())
    }
}

impl SinkConfig {
    /// Get the sink type name
    pub fn sink_type(&self) -> &'static str {
        match self {
            Self::PubSub(_) => "pubsub",
            Self::Stdout(_) => "stdout",
            Self::File(_) => "file",
            Self::Null => "null",
        }
    }
}

/// Pub/Sub sink configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PubSubSinkConfig {
    /// Google Cloud project id (required)
    pub project: String,

    /// REST endpoint; set to the emulator address for local runs
    /// Default: https://pubsub.googleapis.com
    pub endpoint: String,

    /// Service account key file; tokens are refreshed before they expire.
    /// Unset falls back to `access_token_env`, then to application default
    /// credentials when the endpoint is Google's
    pub credentials_file: Option<PathBuf>,

    /// Environment variable holding a fixed bearer token, for emulators;
    /// empty = never read
    /// Default: PUBSUB_ACCESS_TOKEN
    pub access_token_env: String,

    /// Per-request HTTP timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for PubSubSinkConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            endpoint: "https://pubsub.googleapis.com".into(),
            credentials_file: None,
            access_token_env: "PUBSUB_ACCESS_TOKEN".into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Stdout sink configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StdoutSinkConfig {
    /// Prefix each line with the topic name
    /// Default: false
    pub include_topic: bool,
}

/// File sink configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileSinkConfig {
    /// Output file path (required)
    pub path: PathBuf,

    /// fsync each record before acknowledging
    /// Default: false
    pub sync: bool,
}
