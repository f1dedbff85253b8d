//! Bearer tokens for the Pub/Sub publisher
//!
//! Google access tokens expire after about an hour, so the publisher asks a
//! [`TokenSource`] for a token on every request instead of holding one.
//! [`GcpTokenSource`] is backed by `gcp_auth`, which caches the token and
//! fetches a new one shortly before it expires. [`StaticToken`] serves a
//! fixed token for emulators and manual runs.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::common::PublishError;

/// OAuth scope for publishing
pub const PUBSUB_SCOPE: &str = "https://www.googleapis.com/auth/pubsub";

/// Supplies the bearer token for each publish request
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current token
    async fn token(&self) -> Result<String, PublishError>;

    /// Called with a token the service answered 401 for
    fn invalidate(&self, _rejected: &str) {}
}

/// A fixed token that is never refreshed
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, PublishError> {
        Ok(self.0.clone())
    }
}

/// Refreshing tokens from Google credentials
pub struct GcpTokenSource {
    provider: Arc<dyn gcp_auth::TokenProvider>,

    /// Last token the service rejected; handed out again only after the
    /// provider has replaced it
    rejected: Mutex<Option<String>>,
}

impl GcpTokenSource {
    /// Use a service account key file
    pub fn from_credentials_file(path: &Path) -> Result<Self, PublishError> {
        let account = gcp_auth::CustomServiceAccount::from_file(path).map_err(|e| {
            PublishError::config(format!(
                "failed to load credentials from {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self::with_provider(Arc::new(account)))
    }

    /// Discover application default credentials
    ///
    /// Tries `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud user config and the
    /// GCE metadata server, in the order `gcp_auth` documents.
    pub async fn application_default() -> Result<Self, PublishError> {
        let provider = gcp_auth::provider().await.map_err(|e| {
            PublishError::config(format!("no Google credentials found: {e}"))
        })?;
        Ok(Self::with_provider(provider))
    }

    pub fn with_provider(provider: Arc<dyn gcp_auth::TokenProvider>) -> Self {
        Self {
            provider,
            rejected: Mutex::new(None),
        }
    }

    /// Hand out `token` unless it is the one the service last rejected
    fn accept(&self, token: &str) -> Result<String, PublishError> {
        let mut rejected = self.rejected.lock().unwrap_or_else(|p| p.into_inner());
        if rejected.as_deref() == Some(token) {
            return Err(PublishError::Auth(
                "access token was rejected and has not been refreshed yet".into(),
            ));
        }
        *rejected = None;
        Ok(token.to_string())
    }
}

#[async_trait]
impl TokenSource for GcpTokenSource {
    async fn token(&self) -> Result<String, PublishError> {
        let token = self
            .provider
            .token(&[PUBSUB_SCOPE])
            .await
            .map_err(|e| PublishError::Auth(e.to_string()))?;
        self.accept(token.as_str())
    }

    fn invalidate(&self, rejected: &str) {
        *self.rejected.lock().unwrap_or_else(|p| p.into_inner()) = Some(rejected.to_string());
    }
}
