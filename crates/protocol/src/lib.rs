//! Flightfeed Protocol - Position records and their wire formats
//!
//! This crate owns the two formats the pipeline translates between:
//! - the tab-delimited feeder line (input)
//! - the JSON document published to the bus (output)
//!
//! # Input Format
//!
//! One position report per line, 20 tab-separated tokens laid out as
//! key/value pairs:
//!
//! ```text
//! clock	1526120887	hexid	4CC270	ident	ICE470  	squawk	1427	alt	13950	speed	319	airGround	A	lat	51.28232	lon	-0.71182	heading	135
//! ```
//!
//! Only the value positions are read; the key tokens are ignored.
//!
//! # Design Principles
//!
//! - **Strict shape, lenient fields**: a line with the wrong token count is
//!   rejected, a garbled numeric cell is handled by the [`FieldPolicy`]
//! - **Deterministic output**: key order is fixed by [`PositionRecord`]
//! - **Zero-copy hand-off**: encoded payloads are `bytes::Bytes`
//!
//! # Example
//!
//! ```
//! use flightfeed_protocol::{encode, parse_line};
//!
//! let line = "clock\t1526120887\thexid\t4CC270\tident\tICE470  \tsquawk\t1427\talt\t13950\tspeed\t319\tairGround\tA\tlat\t51.28232\tlon\t-0.71182\theading\t135";
//! let parsed = parse_line(line).unwrap();
//! let json = encode(&parsed.record).unwrap();
//! assert!(json.starts_with(br#"{"timestamp":1526120887,"hexId":"4CC270""#));
//! ```

mod encode;
mod error;
mod parse;
mod record;

pub use encode::encode;
pub use error::{EncodeError, Rejection};
pub use parse::{FieldPolicy, LineParser, ParsedLine, parse_line};
pub use record::PositionRecord;

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Number of tab-separated tokens in a position line
pub const FIELD_COUNT: usize = 20;

/// Token separator in feeder lines
pub const FIELD_SEPARATOR: char = '\t';

#[cfg(test)]
mod parse_test;
