//! Pub/Sub publisher - Google Cloud Pub/Sub REST API
//!
//! Publishes each payload as a single message via
//! `POST {endpoint}/v1/projects/{project}/topics/{topic}:publish`.
//!
//! # Acknowledgment
//!
//! A publish succeeds only on a 2xx response carrying at least one message
//! id; the service assigns ids after the message is durably stored.
//!
//! # Authentication
//!
//! Each request asks a [`TokenSource`] for its bearer token. [`PubSubPublisher::connect`]
//! picks one from the configuration, first match wins:
//!
//! 1. `credentials_file`: a service account key, refreshed via `gcp_auth`
//! 2. a fixed token in the `access_token_env` variable, for emulators
//! 3. application default credentials, when the endpoint is Google's
//!
//! An emulator endpoint with none of these publishes without auth.
//!
//! A 401 invalidates the token and the request is sent once more with a
//! fresh one. A second 401 is a permanent rejection.

mod auth;
mod config;

pub use auth::{GcpTokenSource, PUBSUB_SCOPE, StaticToken, TokenSource};
pub use config::{DEFAULT_ACCESS_TOKEN_ENV, DEFAULT_ENDPOINT, PubSubConfig};

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::common::{PublishError, PublisherMetrics, PublisherMetricsSnapshot};
use crate::traits::Publisher;

/// Longest response body kept in a rejection error
const MAX_ERROR_BODY: usize = 512;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    messages: [PubsubMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PubsubMessage<'a> {
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(default, rename = "messageIds")]
    message_ids: Vec<String>,
}

// =============================================================================
// Publisher
// =============================================================================

/// Publisher for Google Cloud Pub/Sub
pub struct PubSubPublisher {
    /// Configuration
    config: PubSubConfig,

    /// HTTP client (connection pooled)
    client: reqwest::Client,

    /// Bearer token supplier; None publishes without auth
    token_source: Option<Arc<dyn TokenSource>>,

    /// Metrics
    metrics: Arc<PublisherMetrics>,
}

impl PubSubPublisher {
    /// Create a publisher without authentication
    pub fn new(config: PubSubConfig) -> Result<Self, PublishError> {
        if config.project.trim().is_empty() {
            return Err(PublishError::config("pubsub project must not be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PublishError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            token_source: None,
            metrics: Arc::new(PublisherMetrics::new()),
        })
    }

    /// Create a publisher with credentials resolved from the configuration
    pub async fn connect(config: PubSubConfig) -> Result<Self, PublishError> {
        let publisher = Self::new(config)?;

        match resolve_token_source(&publisher.config).await? {
            Some(source) => Ok(publisher.with_token_source(source)),
            None => {
                tracing::debug!(
                    endpoint = %publisher.config.endpoint,
                    "no pubsub credentials configured, publishing without auth"
                );
                Ok(publisher)
            }
        }
    }

    /// Use a token source for the bearer token
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Use a fixed bearer token
    #[must_use]
    pub fn with_access_token(self, token: impl Into<String>) -> Self {
        self.with_token_source(Arc::new(StaticToken::new(token)))
    }

    /// Get the configuration
    pub fn config(&self) -> &PubSubConfig {
        &self.config
    }

    async fn send(&self, topic: &str, payload: &[u8]) -> Result<String, PublishError> {
        let data = STANDARD.encode(payload);
        let body = PublishRequest {
            messages: [PubsubMessage { data: &data }],
        };

        let url = self.config.publish_url(topic);

        let mut refreshed = false;
        let response = loop {
            let token = match &self.token_source {
                Some(source) => Some(source.token().await?),
                None => None,
            };

            let mut request = self.client.post(&url).json(&body);
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;

            if response.status() == StatusCode::UNAUTHORIZED && !refreshed {
                if let (Some(source), Some(token)) = (&self.token_source, &token) {
                    tracing::debug!(topic, "pubsub rejected the access token, refreshing");
                    source.invalidate(token);
                    refreshed = true;
                    continue;
                }
            }
            break response;
        };

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        parsed
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::InvalidResponse("response has no message ids".into()))
    }
}

#[async_trait]
impl Publisher for PubSubPublisher {
    fn name(&self) -> &str {
        "pubsub"
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        match self.send(topic, &payload).await {
            Ok(message_id) => {
                self.metrics.record_published(payload.len() as u64);
                tracing::trace!(topic, message_id = %message_id, "pubsub message acknowledged");
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failed();
                Err(e)
            }
        }
    }

    fn metrics(&self) -> PublisherMetricsSnapshot {
        self.metrics.snapshot()
    }
}

async fn resolve_token_source(
    config: &PubSubConfig,
) -> Result<Option<Arc<dyn TokenSource>>, PublishError> {
    if let Some(path) = &config.credentials_file {
        tracing::info!(path = %path.display(), "using pubsub service account credentials");
        return Ok(Some(Arc::new(GcpTokenSource::from_credentials_file(path)?)));
    }

    let env_token = config
        .access_token_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|token| !token.trim().is_empty());
    if let Some(token) = env_token {
        tracing::info!("using fixed pubsub access token from the environment");
        return Ok(Some(Arc::new(StaticToken::new(token))));
    }

    if config.is_google_endpoint() {
        tracing::info!("using application default credentials for pubsub");
        return Ok(Some(Arc::new(GcpTokenSource::application_default().await?)));
    }

    Ok(None)
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
