use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Serial number a spreadsheet assigns to 2000-01-01 (days since 1899-12-30).
pub const SERIAL_2000_01_01: f64 = 36526.0;

/// Unix seconds of 2000-01-01T00:00:00Z.
const UNIX_2000_01_01: i64 = 946_684_800;

const SECONDS_PER_DAY: f64 = 86400.0;

/// One query-result cell, as decided by the source adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<FixedOffset>),
    Null,
    /// A value the adapter had no mapping for, carrying its type name.
    Other(String),
}

/// A typed spreadsheet cell. Serializes as a Sheets `ExtendedValue`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    #[serde(rename = "stringValue")]
    Text(String),
    #[serde(rename = "numberValue")]
    Number(f64),
    #[serde(rename = "boolValue")]
    Boolean(bool),
}

pub type Row = Vec<Cell>;

pub fn encode_value(value: ColumnValue) -> Cell {
    match value {
        ColumnValue::Text(s) => Cell::Text(s),
        ColumnValue::Boolean(b) => Cell::Boolean(b),
        ColumnValue::Integer(i) => Cell::Number(i as f64),
        // JSON has no NaN or infinity; they would arrive as blank cells.
        ColumnValue::Float(f) if !f.is_finite() => Cell::Text(format!("unparsed: {}", f)),
        ColumnValue::Float(f) => Cell::Number(f),
        ColumnValue::Timestamp(t) => Cell::Number(date_serial_number(&t)),
        ColumnValue::Null => Cell::Text("unparsed: null".to_string()),
        ColumnValue::Other(type_name) => Cell::Text(format!("unparsed: {}", type_name)),
    }
}

/// Converts a timestamp to a spreadsheet serial number.
///
/// The day count is measured from 2000-01-01T00:00:00 in the timestamp's own
/// offset using whole unix seconds, then shifted by the serial number of that
/// anchor date. Sub-second precision is dropped.
pub fn date_serial_number(t: &DateTime<FixedOffset>) -> f64 {
    let anchor = UNIX_2000_01_01 - i64::from(t.offset().local_minus_utc());
    let days = (t.timestamp() - anchor) as f64 / SECONDS_PER_DAY;
    days + SERIAL_2000_01_01
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .expect("valid timestamp")
            .fixed_offset()
    }

    #[rstest]
    #[case::text(ColumnValue::Text("hello".into()), Cell::Text("hello".into()))]
    #[case::empty_text(ColumnValue::Text(String::new()), Cell::Text(String::new()))]
    #[case::bool_true(ColumnValue::Boolean(true), Cell::Boolean(true))]
    #[case::bool_false(ColumnValue::Boolean(false), Cell::Boolean(false))]
    #[case::integer(ColumnValue::Integer(42), Cell::Number(42.0))]
    #[case::negative_integer(ColumnValue::Integer(-7), Cell::Number(-7.0))]
    #[case::float(ColumnValue::Float(1.25), Cell::Number(1.25))]
    #[case::nan(ColumnValue::Float(f64::NAN), Cell::Text("unparsed: NaN".into()))]
    #[case::infinity(ColumnValue::Float(f64::INFINITY), Cell::Text("unparsed: inf".into()))]
    #[case::negative_infinity(
        ColumnValue::Float(f64::NEG_INFINITY),
        Cell::Text("unparsed: -inf".into())
    )]
    #[case::null(ColumnValue::Null, Cell::Text("unparsed: null".into()))]
    #[case::other(ColumnValue::Other("Interval".into()), Cell::Text("unparsed: Interval".into()))]
    fn test_encode_value(#[case] value: ColumnValue, #[case] expected: Cell) {
        assert_eq!(encode_value(value), expected);
    }

    #[rstest]
    #[case::anchor(utc(2000, 1, 1, 0, 0, 0), 36526.0)]
    #[case::noon_next_day(utc(2000, 1, 2, 12, 0, 0), 36527.5)]
    #[case::spreadsheet_epoch(utc(1899, 12, 30, 0, 0, 0), 0.0)]
    #[case::six_hours_before(utc(1999, 12, 31, 18, 0, 0), 36525.75)]
    fn test_date_serial_number(#[case] t: DateTime<FixedOffset>, #[case] expected: f64) {
        assert_eq!(encode_value(ColumnValue::Timestamp(t)), Cell::Number(expected));
    }

    #[test]
    fn test_date_serial_number_uses_own_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let t = tz
            .with_ymd_and_hms(2000, 1, 1, 6, 0, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(date_serial_number(&t), 36526.25);
    }

    #[test]
    fn test_date_serial_number_drops_subseconds() {
        let t = utc(2000, 1, 1, 0, 0, 0) + chrono::Duration::milliseconds(900);
        assert_eq!(date_serial_number(&t), 36526.0);
    }

    #[test]
    fn test_cell_serializes_as_extended_value() {
        let json = serde_json::to_value([
            Cell::Text("a".into()),
            Cell::Number(1.5),
            Cell::Boolean(true),
        ])
        .expect("Failed to serialize cells");
        assert_eq!(
            json,
            serde_json::json!([
                {"stringValue": "a"},
                {"numberValue": 1.5},
                {"boolValue": true},
            ])
        );
    }
}
