//! Flightfeed Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file (or no file) reads from a local feeder and prints records
//! to stdout.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use flightfeed_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[publish]\ntopic = \"adsb\"").unwrap();
//! assert_eq!(config.publish.topic, "adsb");
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [source]
//! address = "192.168.1.20:10001"
//!
//! [sink]
//! type = "pubsub"
//! project = "my-project"
//!
//! [publish]
//! topic = "flight-data"
//! ```
//!
//! See `configs/example.toml` for all available options.

mod error;
mod logging;
mod metrics;
mod pipeline;
mod publish;
mod sink;
mod source;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use pipeline::{InvalidFieldPolicy, PipelineConfig, PipelineMode};
pub use publish::{PublishConfig, RetryConfig};
pub use sink::{FileSinkConfig, PubSubSinkConfig, SinkConfig, StdoutSinkConfig};
pub use source::SourceConfig;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults. Loaded once at startup
/// and passed down; nothing reads configuration from global state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Feeder connection
    pub source: SourceConfig,

    /// Active publisher
    pub sink: SinkConfig,

    /// Topic, timeout and retry for publishing
    pub publish: PublishConfig,

    /// Execution mode and record handling
    pub pipeline: PipelineConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Run again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
