use ::duckdb::types::{TimeUnit, ValueRef};
use ::duckdb::Connection;
use chrono::{DateTime, Utc};

use super::{split_last_statement, QueryResult, QuerySource};
use crate::value::ColumnValue;
use crate::Result;

const SECONDS_PER_DAY: i64 = 86400;

pub struct DuckDBSource {
    conn: Connection,
}

impl DuckDBSource {
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path.is_empty() || path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        DuckDBSource { conn }
    }
}

impl QuerySource for DuckDBSource {
    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        query_rows(&self.conn, sql)
    }
}

pub fn query_rows(conn: &Connection, sql: &str) -> Result<QueryResult> {
    let (leading, last) = split_last_statement(sql);
    if let Some(leading) = leading {
        conn.execute_batch(leading)?;
    }
    let mut statement = conn.prepare(last)?;
    let mut rows = statement.query([])?;

    // The schema only exists once the statement has run.
    let columns = rows
        .as_ref()
        .map(|stmt| stmt.column_names())
        .unwrap_or_default();

    let mut result = QueryResult {
        columns,
        rows: Vec::new(),
    };
    while let Some(row) = rows.next()? {
        let values = (0..result.columns.len())
            .map(|i| row.get_ref(i).map(column_value))
            .collect::<Result<Vec<_>, _>>()?;
        result.rows.push(values);
    }
    Ok(result)
}

fn column_value(value: ValueRef<'_>) -> ColumnValue {
    match value {
        ValueRef::Null => ColumnValue::Null,
        ValueRef::Boolean(b) => ColumnValue::Boolean(b),
        ValueRef::TinyInt(i) => ColumnValue::Integer(i.into()),
        ValueRef::SmallInt(i) => ColumnValue::Integer(i.into()),
        ValueRef::Int(i) => ColumnValue::Integer(i.into()),
        ValueRef::BigInt(i) => ColumnValue::Integer(i),
        ValueRef::UTinyInt(i) => ColumnValue::Integer(i.into()),
        ValueRef::USmallInt(i) => ColumnValue::Integer(i.into()),
        ValueRef::UInt(i) => ColumnValue::Integer(i.into()),
        ValueRef::UBigInt(i) => ColumnValue::Float(i as f64),
        ValueRef::HugeInt(i) => ColumnValue::Float(i as f64),
        ValueRef::Float(f) => ColumnValue::Float(f.into()),
        ValueRef::Double(f) => ColumnValue::Float(f),
        ValueRef::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(f) => ColumnValue::Float(f),
            Err(_) => ColumnValue::Other(format!("Decimal({})", d)),
        },
        ValueRef::Text(bytes) => ColumnValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Timestamp(unit, raw) => timestamp(unit, raw),
        ValueRef::Date32(days) => date(days),
        other => ColumnValue::Other(type_name(&other)),
    }
}

fn timestamp(unit: TimeUnit, raw: i64) -> ColumnValue {
    let per_second: i64 = match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    };
    let secs = raw.div_euclid(per_second);
    let nanos = raw.rem_euclid(per_second) * (1_000_000_000 / per_second);
    match DateTime::<Utc>::from_timestamp(secs, nanos as u32) {
        Some(t) => ColumnValue::Timestamp(t.fixed_offset()),
        None => ColumnValue::Other(format!("Timestamp({})", raw)),
    }
}

fn date(days: i32) -> ColumnValue {
    match DateTime::<Utc>::from_timestamp(i64::from(days) * SECONDS_PER_DAY, 0) {
        Some(t) => ColumnValue::Timestamp(t.fixed_offset()),
        None => ColumnValue::Other(format!("Date32({})", days)),
    }
}

/// Name of the value's variant, e.g. `Interval` or `List`.
fn type_name(value: &ValueRef<'_>) -> String {
    let debug = format!("{:?}", value);
    debug
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::encode::encode_row;
    use crate::value::Cell;

    /// A query plus the cells its rows should encode to, one JSON array per
    /// line.
    #[derive(Debug, Serialize, Deserialize)]
    struct TestSpec {
        query: String,
        columns: Vec<String>,
        expected: String,
    }

    impl TestSpec {
        pub fn from_yaml(yaml: &str) -> Self {
            serde_yaml::from_str(yaml).expect("Failed to parse yaml")
        }

        fn run(&self, connection: &Connection) {
            let result = query_rows(connection, &self.query).expect("Failed to run query");
            assert_eq!(result.columns, self.columns);

            let actual = result
                .rows
                .into_iter()
                .map(|row| {
                    serde_json::to_string(&encode_row(row)).expect("Failed to serialize row")
                })
                .map(|line| line + "\n")
                .collect::<String>();
            println!("{}", actual);
            assert_eq!(actual, self.expected);
        }
    }

    #[fixture]
    fn connection() -> Connection {
        Connection::open_in_memory().expect("Failed to open connection")
    }

    #[rstest]
    #[case::scalars(TestSpec::from_yaml(
        r#"
        query: |
            SELECT 1 AS a, 'x' AS b, true AS c, 2.5::DOUBLE AS d
        columns: [a, b, c, d]
        expected: |
            [{"numberValue":1.0},{"stringValue":"x"},{"boolValue":true},{"numberValue":2.5}]
    "#
    ))]
    #[case::timestamps(TestSpec::from_yaml(
        r#"
        query: |
            SELECT TIMESTAMP '2000-01-02 12:00:00' AS ts, DATE '2000-01-01' AS dt
        columns: [ts, dt]
        expected: |
            [{"numberValue":36527.5},{"numberValue":36526.0}]
    "#
    ))]
    #[case::nulls_and_integers(TestSpec::from_yaml(
        r#"
        query: |
            SELECT NULL AS n, 7::TINYINT AS t, 9::UBIGINT AS u
        columns: [n, t, u]
        expected: |
            [{"stringValue":"unparsed: null"},{"numberValue":7.0},{"numberValue":9.0}]
    "#
    ))]
    #[case::several_rows(TestSpec::from_yaml(
        r#"
        query: |
            SELECT * FROM (VALUES (1, 'a'), (2, 'b')) AS t(id, name) ORDER BY id
        columns: [id, name]
        expected: |
            [{"numberValue":1.0},{"stringValue":"a"}]
            [{"numberValue":2.0},{"stringValue":"b"}]
    "#
    ))]
    #[case::non_finite_floats(TestSpec::from_yaml(
        r#"
        query: |
            SELECT 'nan'::DOUBLE AS n, 'inf'::DOUBLE AS i, '-inf'::DOUBLE AS m, 0.5::DOUBLE AS f
        columns: [n, i, m, f]
        expected: |
            [{"stringValue":"unparsed: NaN"},{"stringValue":"unparsed: inf"},{"stringValue":"unparsed: -inf"},{"numberValue":0.5}]
    "#
    ))]
    #[case::leading_statements(TestSpec::from_yaml(
        r#"
        query: |
            CREATE TABLE items (id INTEGER, label VARCHAR);
            INSERT INTO items VALUES (1, 'one;two'), (2, 'three');
            SELECT label FROM items ORDER BY id;
        columns: [label]
        expected: |
            [{"stringValue":"one;two"}]
            [{"stringValue":"three"}]
    "#
    ))]
    #[case::no_rows(TestSpec::from_yaml(
        r#"
        query: |
            SELECT 1 AS a, 'x' AS b WHERE false
        columns: [a, b]
        expected: ""
    "#
    ))]
    fn test_query_rows(connection: Connection, #[case] test_spec: TestSpec) {
        test_spec.run(&connection);
    }

    #[rstest]
    fn test_unrecognized_type_names_itself(connection: Connection) {
        let result =
            query_rows(&connection, "SELECT INTERVAL 1 DAY AS i").expect("Failed to run query");
        let cells = encode_row(result.rows[0].clone());
        match &cells[0] {
            Cell::Text(s) => assert_eq!(s, "unparsed: Interval"),
            other => panic!("expected diagnostic text, got {:?}", other),
        }
    }
}
