//! Protocol error types
//!
//! Rejections are the expected "not our record" path and are never fatal.
//! Encode errors indicate a defect and terminate the pipeline.

use thiserror::Error;

/// Reasons a line produced no record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Token count differs from the fixed schema
    #[error("expected 20 fields, got {fields}")]
    ShapeMismatch { fields: usize },

    /// A numeric cell failed to parse under the strict field policy
    #[error("invalid {field} value: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

impl Rejection {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::InvalidField { .. } => "invalid_field",
        }
    }
}

/// Failure to serialize a record
#[derive(Debug, Error)]
#[error("failed to encode position record: {0}")]
pub struct EncodeError(#[from] serde_json::Error);
