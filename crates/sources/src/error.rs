//! Source error types

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while connecting to or reading from a line source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the feeder
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Connect did not complete in time
    #[error("connect to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    /// I/O error while reading
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Feed was silent for longer than the read timeout
    #[error("no data received for {0:?}")]
    ReadTimeout(Duration),

    /// Read attempted without an open connection
    #[error("source is not connected")]
    NotConnected,

    /// The source cannot be reopened (files, stdin, buffers)
    #[error("source does not support reconnecting")]
    ReconnectUnsupported,
}

impl SourceError {
    /// Whether a reconnect attempt can possibly help
    pub fn is_reconnectable(&self) -> bool {
        !matches!(self, Self::ReconnectUnsupported)
    }
}

/// Check if error is a connection reset (expected when the feeder restarts)
pub(crate) fn is_connection_reset(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
