//! Position record type

use serde::{Deserialize, Serialize};

/// One decoded telemetry sample
///
/// Field declaration order is the JSON key order. The serde renames keep the
/// wire keys downstream consumers already depend on, including the lowercase
/// `airground`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Report time in seconds since the Unix epoch
    pub timestamp: i64,

    /// ICAO 24-bit address as hex; may be empty
    #[serde(rename = "hexId")]
    pub hex_id: String,

    /// Callsign, trimmed of surrounding whitespace
    pub ident: String,

    /// Transponder code
    pub squawk: i64,

    /// Altitude in feet
    pub alt: i64,

    /// Ground speed in knots
    pub speed: i64,

    /// Air/ground status flag, passed through verbatim
    #[serde(rename = "airground")]
    pub air_ground: String,

    /// Latitude in decimal degrees
    pub lat: f64,

    /// Longitude in decimal degrees
    pub lon: f64,

    /// Track in degrees
    pub heading: i64,
}
