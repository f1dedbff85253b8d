//! Feeder line parser
//!
//! Converts one raw line into a [`PositionRecord`]. The shape check is strict:
//! anything other than exactly [`FIELD_COUNT`] tokens is rejected. Numeric
//! cells are handled by the configured [`FieldPolicy`].

use std::str::FromStr;

use crate::error::Rejection;
use crate::record::PositionRecord;
use crate::{FIELD_COUNT, FIELD_SEPARATOR};

// Value positions (0-indexed). Even positions hold the key names.
const TIMESTAMP: usize = 1;
const HEX_ID: usize = 3;
const IDENT: usize = 5;
const SQUAWK: usize = 7;
const ALT: usize = 9;
const SPEED: usize = 11;
const AIR_GROUND: usize = 13;
const LAT: usize = 15;
const LON: usize = 17;
const HEADING: usize = 19;

/// What to do with a numeric cell that fails to parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Use 0 / 0.0 for the field and keep the record (feeder default)
    #[default]
    ZeroOnParseFailure,
    /// Reject the whole line
    RejectOnParseFailure,
}

/// A successfully parsed line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    /// The decoded record
    pub record: PositionRecord,

    /// Names of numeric fields that fell back to zero
    pub defaulted: Vec<&'static str>,
}

impl ParsedLine {
    /// Whether every numeric cell parsed cleanly
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.defaulted.is_empty()
    }
}

/// Line parser with a fixed field policy
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser {
    policy: FieldPolicy,
}

impl LineParser {
    /// Create a parser with the given field policy
    pub const fn new(policy: FieldPolicy) -> Self {
        Self { policy }
    }

    /// Get the field policy
    #[inline]
    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    /// Parse one line (without its terminator)
    pub fn parse(&self, line: &str) -> Result<ParsedLine, Rejection> {
        let mut tokens = [""; FIELD_COUNT];
        let mut fields = 0;
        for token in line.split(FIELD_SEPARATOR) {
            if fields < FIELD_COUNT {
                tokens[fields] = token;
            }
            fields += 1;
        }

        if fields != FIELD_COUNT {
            return Err(Rejection::ShapeMismatch { fields });
        }

        let mut cells = Cells {
            policy: self.policy,
            defaulted: Vec::new(),
        };

        let record = PositionRecord {
            timestamp: cells.number("timestamp", tokens[TIMESTAMP])?,
            hex_id: tokens[HEX_ID].to_string(),
            ident: tokens[IDENT].trim().to_string(),
            squawk: cells.number("squawk", tokens[SQUAWK])?,
            alt: cells.number("alt", tokens[ALT])?,
            speed: cells.number("speed", tokens[SPEED])?,
            air_ground: tokens[AIR_GROUND].to_string(),
            lat: cells.coordinate("lat", tokens[LAT])?,
            lon: cells.coordinate("lon", tokens[LON])?,
            heading: cells.number("heading", tokens[HEADING])?,
        };

        Ok(ParsedLine {
            record,
            defaulted: cells.defaulted,
        })
    }
}

/// Parse a line with the default [`FieldPolicy::ZeroOnParseFailure`]
pub fn parse_line(line: &str) -> Result<ParsedLine, Rejection> {
    LineParser::default().parse(line)
}

/// Numeric cell conversion under a policy
struct Cells {
    policy: FieldPolicy,
    defaulted: Vec<&'static str>,
}

impl Cells {
    fn number<T: FromStr + Default>(
        &mut self,
        field: &'static str,
        raw: &str,
    ) -> Result<T, Rejection> {
        match raw.parse() {
            Ok(value) => Ok(value),
            Err(_) => self.fallback(field, raw),
        }
    }

    /// Non-finite values have no JSON representation and count as failures.
    fn coordinate(&mut self, field: &'static str, raw: &str) -> Result<f64, Rejection> {
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => self.fallback(field, raw),
        }
    }

    fn fallback<T: Default>(&mut self, field: &'static str, raw: &str) -> Result<T, Rejection> {
        match self.policy {
            FieldPolicy::ZeroOnParseFailure => {
                self.defaulted.push(field);
                Ok(T::default())
            }
            FieldPolicy::RejectOnParseFailure => Err(Rejection::InvalidField {
                field,
                value: raw.to_string(),
            }),
        }
    }
}
