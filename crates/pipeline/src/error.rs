//! Pipeline error types
//!
//! Only failures that end the pipeline are errors here. Rejected lines and
//! defaulted fields are counted, not raised.

use std::fmt;

use flightfeed_protocol::EncodeError;
use flightfeed_sinks::PublishError;
use flightfeed_sources::SourceError;
use thiserror::Error;

/// Why the pipeline stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The feed ended or failed and could not be reopened
    ReaderFailure,
    /// A record could not be serialized
    EncodeFailure,
    /// The sink did not acknowledge a record within the retry policy
    PublishFailure,
    /// Graceful stop requested by the caller
    Shutdown,
}

impl TerminationReason {
    /// Short label for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReaderFailure => "reader_failure",
            Self::EncodeFailure => "encode_failure",
            Self::PublishFailure => "publish_failure",
            Self::Shutdown => "shutdown",
        }
    }

    /// Whether the stop was requested rather than caused by a failure
    pub const fn is_graceful(self) -> bool {
        matches!(self, Self::Shutdown)
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Read failed and reconnecting did not help
    #[error("reader failed after {attempts} reconnect attempts: {source}")]
    Reader {
        attempts: u32,
        #[source]
        source: SourceError,
    },

    /// Feed ended and the source could not be reopened
    #[error("feed ended after {attempts} reconnect attempts")]
    EndOfStream { attempts: u32 },

    /// Record serialization failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Publish failed after retries
    #[error("publish failed after {attempts} attempts: {source}")]
    Publish {
        attempts: u32,
        #[source]
        source: PublishError,
    },

    /// A pipeline stage task panicked or was aborted
    #[error("{stage} stage failed: {message}")]
    Stage {
        stage: &'static str,
        reason: TerminationReason,
        message: String,
    },

    /// `run` called on a pipeline that already stopped
    #[error("pipeline already terminated ({0})")]
    AlreadyTerminated(TerminationReason),
}

impl PipelineError {
    /// Termination reason this error maps to
    pub fn reason(&self) -> TerminationReason {
        match self {
            Self::Reader { .. } | Self::EndOfStream { .. } => TerminationReason::ReaderFailure,
            Self::Encode(_) => TerminationReason::EncodeFailure,
            Self::Publish { .. } => TerminationReason::PublishFailure,
            Self::Stage { reason, .. } => *reason,
            Self::AlreadyTerminated(reason) => *reason,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_mapping() {
        let err = PipelineError::EndOfStream { attempts: 0 };
        assert_eq!(err.reason(), TerminationReason::ReaderFailure);

        let err = PipelineError::Reader {
            attempts: 3,
            source: SourceError::NotConnected,
        };
        assert_eq!(err.reason(), TerminationReason::ReaderFailure);

        let err = PipelineError::Publish {
            attempts: 4,
            source: PublishError::Closed,
        };
        assert_eq!(err.reason(), TerminationReason::PublishFailure);

        let err = PipelineError::AlreadyTerminated(TerminationReason::Shutdown);
        assert_eq!(err.reason(), TerminationReason::Shutdown);
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::Publish {
            attempts: 4,
            source: PublishError::Closed,
        };
        assert!(err.to_string().contains("4 attempts"));
        assert!(err.to_string().contains("closed"));

        let err = PipelineError::EndOfStream { attempts: 0 };
        assert!(err.to_string().contains("feed ended"));
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(TerminationReason::ReaderFailure.to_string(), "reader_failure");
        assert_eq!(TerminationReason::EncodeFailure.as_str(), "encode_failure");
        assert_eq!(TerminationReason::PublishFailure.as_str(), "publish_failure");
        assert!(TerminationReason::Shutdown.is_graceful());
        assert!(!TerminationReason::PublishFailure.is_graceful());
    }
}
