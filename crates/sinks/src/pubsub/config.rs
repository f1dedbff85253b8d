//! Pub/Sub publisher configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default Pub/Sub REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Default environment variable holding the OAuth access token
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "PUBSUB_ACCESS_TOKEN";

/// Default HTTP request timeout (30s)
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Pub/Sub publisher
#[derive(Debug, Clone)]
pub struct PubSubConfig {
    /// Google Cloud project id
    pub project: String,

    /// REST endpoint; point at an emulator with `http://localhost:8085`
    pub endpoint: String,

    /// Service account key file; refreshed tokens are minted from it
    pub credentials_file: Option<PathBuf>,

    /// Environment variable holding a fixed bearer token, for emulators
    pub access_token_env: Option<String>,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            endpoint: DEFAULT_ENDPOINT.into(),
            credentials_file: None,
            access_token_env: Some(DEFAULT_ACCESS_TOKEN_ENV.into()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl PubSubConfig {
    /// Create config for a project with default endpoint and auth
    pub fn with_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    /// Whether the endpoint is the Google service rather than an emulator
    pub fn is_google_endpoint(&self) -> bool {
        self.endpoint.trim_end_matches('/') == DEFAULT_ENDPOINT
    }

    /// URL of the `topics.publish` method for a topic
    pub fn publish_url(&self, topic: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.endpoint.trim_end_matches('/'),
            self.project,
            topic
        )
    }
}
