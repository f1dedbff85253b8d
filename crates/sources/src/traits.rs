//! Line source trait definition

use async_trait::async_trait;

use crate::error::SourceError;

/// A stream of feeder lines
///
/// The pipeline pulls one line at a time and decides what to do on end of
/// stream or error; sources never retry on their own.
#[async_trait]
pub trait LineSource: Send {
    /// Source name for logging
    fn name(&self) -> &str;

    /// Read the next line without its terminator
    ///
    /// Returns `Ok(None)` at end of stream.
    async fn next_line(&mut self) -> Result<Option<String>, SourceError>;

    /// Whether `reconnect()` can reopen the stream
    fn can_reconnect(&self) -> bool {
        false
    }

    /// Reopen the underlying stream after end of stream or an error
    async fn reconnect(&mut self) -> Result<(), SourceError> {
        Err(SourceError::ReconnectUnsupported)
    }
}
