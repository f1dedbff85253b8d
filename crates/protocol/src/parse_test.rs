//! Tests for the feeder line parser

use crate::{FieldPolicy, LineParser, PositionRecord, Rejection, parse_line};

const SAMPLE: &str = "clock\t1526120887\thexid\t4CC270\tident\tICE470  \tsquawk\t1427\talt\t13950\tspeed\t319\tairGround\tA\tlat\t51.28232\tlon\t-0.71182\theading\t135";

/// Build a 20-token line from the ten value cells
fn line_with(values: [&str; 10]) -> String {
    let keys = [
        "clock",
        "hexid",
        "ident",
        "squawk",
        "alt",
        "speed",
        "airGround",
        "lat",
        "lon",
        "heading",
    ];
    keys.iter()
        .zip(values.iter())
        .flat_map(|(k, v)| [*k, *v])
        .collect::<Vec<_>>()
        .join("\t")
}

// ============================================================================
// Shape
// ============================================================================

#[test]
fn test_parse_sample_line() {
    let parsed = parse_line(SAMPLE).unwrap();

    assert!(parsed.is_clean());
    assert_eq!(
        parsed.record,
        PositionRecord {
            timestamp: 1526120887,
            hex_id: "4CC270".into(),
            ident: "ICE470".into(),
            squawk: 1427,
            alt: 13950,
            speed: 319,
            air_ground: "A".into(),
            lat: 51.28232,
            lon: -0.71182,
            heading: 135,
        }
    );
}

#[test]
fn test_ten_fields_rejected() {
    let line = "clock\t1526120887\thexid\t4CC270\tident\tICE470\tsquawk\t1427\talt\t13950";
    assert_eq!(
        parse_line(line),
        Err(Rejection::ShapeMismatch { fields: 10 })
    );
}

#[test]
fn test_extra_field_rejected() {
    let line = format!("{SAMPLE}\textra");
    assert_eq!(
        parse_line(&line),
        Err(Rejection::ShapeMismatch { fields: 21 })
    );
}

#[test]
fn test_empty_line_rejected() {
    assert_eq!(parse_line(""), Err(Rejection::ShapeMismatch { fields: 1 }));
}

#[test]
fn test_trailing_tab_counts_as_field() {
    // 19 real tokens plus an empty one after the trailing tab
    let mut line = SAMPLE.rsplit_once('\t').unwrap().0.to_string();
    line.push('\t');
    let parsed = parse_line(&line).unwrap();
    assert_eq!(parsed.record.heading, 0);
    assert_eq!(parsed.defaulted, vec!["heading"]);
}

#[test]
fn test_key_tokens_are_ignored() {
    let line = SAMPLE.replace("clock", "zzz").replace("hexid", "");
    let parsed = parse_line(&line).unwrap();
    assert_eq!(parsed.record.timestamp, 1526120887);
    assert_eq!(parsed.record.hex_id, "4CC270");
}

// ============================================================================
// Field values
// ============================================================================

#[test]
fn test_ident_trimmed_hex_id_verbatim() {
    let line = line_with([
        "1", " 4CC270 ", "  ICE470\t", "0", "0", "0", "A", "0", "0", "0",
    ]);
    // The tab inside the ident cell splits the line into 21 tokens
    assert!(parse_line(&line).is_err());

    let line = line_with([
        "1", " 4CC270 ", "  ICE470  ", "0", "0", "0", " G ", "0", "0", "0",
    ]);
    let record = parse_line(&line).unwrap().record;
    assert_eq!(record.hex_id, " 4CC270 ");
    assert_eq!(record.ident, "ICE470");
    assert_eq!(record.air_ground, " G ");
}

#[test]
fn test_empty_strings_allowed() {
    let line = line_with(["1", "", "", "0", "0", "0", "", "0", "0", "0"]);
    let record = parse_line(&line).unwrap().record;
    assert_eq!(record.hex_id, "");
    assert_eq!(record.ident, "");
    assert_eq!(record.air_ground, "");
}

#[test]
fn test_non_numeric_cell_defaults_to_zero() {
    let line = line_with([
        "1526120887", "4CC270", "ICE470", "1427", "", "319", "A", "51.28232", "-0.71182", "135",
    ]);
    let parsed = parse_line(&line).unwrap();

    assert_eq!(parsed.record.alt, 0);
    assert_eq!(parsed.record.squawk, 1427);
    assert_eq!(parsed.record.speed, 319);
    assert_eq!(parsed.record.lat, 51.28232);
    assert_eq!(parsed.defaulted, vec!["alt"]);
}

#[test]
fn test_every_numeric_column_defaults() {
    let line = line_with(["x", "4CC270", "ICE470", "x", "x", "x", "A", "x", "x", "x"]);
    let parsed = parse_line(&line).unwrap();

    assert_eq!(parsed.record.timestamp, 0);
    assert_eq!(parsed.record.squawk, 0);
    assert_eq!(parsed.record.alt, 0);
    assert_eq!(parsed.record.speed, 0);
    assert_eq!(parsed.record.lat, 0.0);
    assert_eq!(parsed.record.lon, 0.0);
    assert_eq!(parsed.record.heading, 0);
    assert_eq!(parsed.record.hex_id, "4CC270");
    assert_eq!(
        parsed.defaulted,
        vec!["timestamp", "squawk", "alt", "speed", "lat", "lon", "heading"]
    );
}

#[test]
fn test_float_in_integer_column_defaults() {
    let line = line_with([
        "1526120887", "4CC270", "ICE470", "1427", "13950.5", "319", "A", "1", "2", "135",
    ]);
    let parsed = parse_line(&line).unwrap();
    assert_eq!(parsed.record.alt, 0);
    assert_eq!(parsed.record.lat, 1.0);
}

#[test]
fn test_signed_integers() {
    let line = line_with(["-5", "h", "i", "+1200", "-300", "0", "G", "0", "0", "-1"]);
    let record = parse_line(&line).unwrap().record;
    assert_eq!(record.timestamp, -5);
    assert_eq!(record.squawk, 1200);
    assert_eq!(record.alt, -300);
    assert_eq!(record.heading, -1);
}

#[test]
fn test_surrounding_whitespace_in_number_defaults() {
    let line = line_with(["1", "h", "i", " 1427", "0", "0", "A", "0", "0", "0"]);
    let parsed = parse_line(&line).unwrap();
    assert_eq!(parsed.record.squawk, 0);
    assert_eq!(parsed.defaulted, vec!["squawk"]);
}

#[test]
fn test_integer_overflow_defaults() {
    let line = line_with([
        "99999999999999999999",
        "h",
        "i",
        "0",
        "0",
        "0",
        "A",
        "0",
        "0",
        "0",
    ]);
    let parsed = parse_line(&line).unwrap();
    assert_eq!(parsed.record.timestamp, 0);
    assert_eq!(parsed.defaulted, vec!["timestamp"]);
}

#[test]
fn test_non_finite_coordinates_default() {
    let line = line_with(["1", "h", "i", "0", "0", "0", "A", "NaN", "inf", "0"]);
    let parsed = parse_line(&line).unwrap();
    assert_eq!(parsed.record.lat, 0.0);
    assert_eq!(parsed.record.lon, 0.0);
    assert_eq!(parsed.defaulted, vec!["lat", "lon"]);
}

// ============================================================================
// Strict policy
// ============================================================================

#[test]
fn test_strict_policy_rejects_bad_cell() {
    let parser = LineParser::new(FieldPolicy::RejectOnParseFailure);
    let line = line_with(["1", "h", "i", "0", "12x", "0", "A", "0", "0", "0"]);

    assert_eq!(
        parser.parse(&line),
        Err(Rejection::InvalidField {
            field: "alt",
            value: "12x".into(),
        })
    );
}

#[test]
fn test_strict_policy_accepts_clean_line() {
    let parser = LineParser::new(FieldPolicy::RejectOnParseFailure);
    assert_eq!(parser.policy(), FieldPolicy::RejectOnParseFailure);

    let parsed = parser.parse(SAMPLE).unwrap();
    assert!(parsed.is_clean());
    assert_eq!(parsed.record.ident, "ICE470");
}

#[test]
fn test_default_policy_is_zero() {
    assert_eq!(LineParser::default().policy(), FieldPolicy::ZeroOnParseFailure);
}
