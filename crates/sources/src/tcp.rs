//! TCP Source
//!
//! Client connection to a feeder that serves position lines over TCP
//! (`faup1090`-style tab-separated output).
//!
//! # Design
//!
//! - **Outbound connection** - we dial the feeder, it does not dial us
//! - **Reconnectable** - `reconnect()` re-dials; metrics survive reconnects
//! - **Optional read timeout** - a silent feed surfaces as an error instead
//!   of blocking forever
//!
//! # Example
//!
//! ```ignore
//! let config = TcpSourceConfig {
//!     address: "192.168.1.20:10001".into(),
//!     read_timeout: Some(Duration::from_secs(300)),
//!     ..Default::default()
//! };
//!
//! let mut source = TcpLineSource::connect(config).await?;
//! let line = source.next_line().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::common::SourceMetrics;
use crate::error::{SourceError, is_connection_reset};
use crate::reader::{DEFAULT_MAX_LINE_SIZE, LineReader};
use crate::traits::LineSource;

// =============================================================================
// Constants
// =============================================================================

/// Default feeder address (faup1090 TSV port)
const DEFAULT_ADDRESS: &str = "127.0.0.1:10001";

/// Default connect timeout (10s)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read buffer size (64KB)
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default keepalive interval (30s)
const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

// =============================================================================
// Configuration
// =============================================================================

/// TCP source configuration
#[derive(Debug, Clone)]
pub struct TcpSourceConfig {
    /// Source identifier for logging
    pub id: String,

    /// Feeder address (`host:port`)
    pub address: String,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Maximum silence before a read fails (None = wait forever)
    pub read_timeout: Option<Duration>,

    /// Longest accepted line in bytes
    pub max_line_size: usize,

    /// Read buffer size
    pub buffer_size: usize,

    /// TCP nodelay (disable Nagle's algorithm)
    pub nodelay: bool,

    /// TCP keepalive interval (None = disabled)
    pub keepalive: Option<Duration>,
}

impl Default for TcpSourceConfig {
    fn default() -> Self {
        Self {
            id: "tcp".into(),
            address: DEFAULT_ADDRESS.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            nodelay: true,
            keepalive: Some(DEFAULT_KEEPALIVE_INTERVAL),
        }
    }
}

impl TcpSourceConfig {
    /// Create config for a feeder address
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }
}

// =============================================================================
// Source Implementation
// =============================================================================

/// Line source reading from a TCP connection
pub struct TcpLineSource {
    /// Configuration
    config: TcpSourceConfig,

    /// Open connection, if any
    reader: Option<LineReader<BufReader<TcpStream>>>,

    /// Metrics
    metrics: Arc<SourceMetrics>,
}

impl TcpLineSource {
    /// Create a disconnected source; the first `reconnect()` dials
    pub fn new(config: TcpSourceConfig) -> Self {
        Self {
            config,
            reader: None,
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    /// Create a source and dial the feeder
    pub async fn connect(config: TcpSourceConfig) -> Result<Self, SourceError> {
        let mut source = Self::new(config);
        source.open().await?;
        Ok(source)
    }

    /// Get metrics reference
    pub fn metrics(&self) -> &Arc<SourceMetrics> {
        &self.metrics
    }

    /// Get the configuration
    pub fn config(&self) -> &TcpSourceConfig {
        &self.config
    }

    /// Check if a connection is open
    pub fn is_connected(&self) -> bool {
        self.reader.is_some()
    }

    /// Dial the feeder, replacing any existing connection
    async fn open(&mut self) -> Result<(), SourceError> {
        self.reader = None;

        let address = &self.config.address;
        let stream = match timeout(self.config.connect_timeout, TcpStream::connect(address)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(SourceError::Connect {
                    address: address.clone(),
                    source: e,
                });
            }
            Err(_) => {
                return Err(SourceError::ConnectTimeout {
                    address: address.clone(),
                    timeout: self.config.connect_timeout,
                });
            }
        };

        self.configure_socket(&stream);
        self.metrics.connection_opened();

        tracing::info!(
            source = %self.config.id,
            address = %self.config.address,
            "connected to feeder"
        );

        let buffered = BufReader::with_capacity(self.config.buffer_size, stream);
        self.reader = Some(
            LineReader::with_metrics(buffered, self.config.max_line_size, Arc::clone(&self.metrics))
                .with_name(self.config.id.clone()),
        );
        Ok(())
    }

    /// Apply nodelay and keepalive (non-fatal on failure)
    fn configure_socket(&self, stream: &TcpStream) {
        if self.config.nodelay
            && let Err(e) = stream.set_nodelay(true)
        {
            tracing::warn!(error = %e, "Failed to set TCP_NODELAY");
        }

        if let Some(interval) = self.config.keepalive {
            let keepalive = TcpKeepalive::new().with_time(interval);
            if let Err(e) = SockRef::from(stream).set_tcp_keepalive(&keepalive) {
                tracing::warn!(error = %e, "Failed to set TCP keepalive");
            }
        }
    }
}

#[async_trait]
impl LineSource for TcpLineSource {
    fn name(&self) -> &str {
        &self.config.id
    }

    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        let read_timeout = self.config.read_timeout;
        let Some(reader) = self.reader.as_mut() else {
            return Err(SourceError::NotConnected);
        };

        let result = match read_timeout {
            Some(limit) => match timeout(limit, reader.read_line()).await {
                Ok(result) => result,
                Err(_) => {
                    self.reader = None;
                    return Err(SourceError::ReadTimeout(limit));
                }
            },
            None => reader.read_line().await,
        };

        match result {
            Ok(Some(line)) => Ok(Some(line)),
            Ok(None) => {
                tracing::debug!(
                    source = %self.config.id,
                    address = %self.config.address,
                    "feeder closed the connection"
                );
                self.reader = None;
                Ok(None)
            }
            Err(e) => {
                if !is_connection_reset(&e) {
                    self.metrics.error();
                }
                self.reader = None;
                Err(SourceError::Io(e))
            }
        }
    }

    fn can_reconnect(&self) -> bool {
        true
    }

    async fn reconnect(&mut self) -> Result<(), SourceError> {
        self.open().await
    }
}
