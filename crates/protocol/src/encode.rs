//! JSON encoder for position records

use bytes::Bytes;

use crate::error::EncodeError;
use crate::record::PositionRecord;

/// Serialize a record into its compact JSON wire form
///
/// Keys are emitted in declaration order, so equal records always encode to
/// identical bytes.
pub fn encode(record: &PositionRecord) -> Result<Bytes, EncodeError> {
    let buf = serde_json::to_vec(record)?;
    Ok(Bytes::from(buf))
}
