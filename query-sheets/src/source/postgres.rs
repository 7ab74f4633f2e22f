use ::postgres::types::{FromSql, Type};
use ::postgres::{Client, NoTls, Row};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::debug;

use super::{split_last_statement, QueryResult, QuerySource};
use crate::value::ColumnValue;
use crate::Result;

pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    pub fn connect(dsn: &str) -> Result<Self> {
        let client = Client::connect(dsn, NoTls)?;
        Ok(PostgresSource { client })
    }
}

impl QuerySource for PostgresSource {
    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let (leading, last) = split_last_statement(sql);
        if let Some(leading) = leading {
            self.client.batch_execute(leading)?;
        }

        // Preparing first gives us the columns even when no rows come back.
        let statement = self.client.prepare(last)?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>();
        let types = statement
            .columns()
            .iter()
            .map(|c| c.type_().clone())
            .collect::<Vec<_>>();
        debug!(?types, "Prepared statement");

        let rows = self
            .client
            .query(&statement, &[])?
            .iter()
            .map(|row| {
                types
                    .iter()
                    .enumerate()
                    .map(|(idx, ty)| column_value(row, idx, ty))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(QueryResult { columns, rows })
    }
}

/// Accepts any column type without decoding it, so NULL can be told apart
/// from a value we have no mapping for.
struct Unrecognized;

impl<'a> FromSql<'a> for Unrecognized {
    fn from_sql(
        _ty: &Type,
        _raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(Unrecognized)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// How a column of a given postgres type is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoder {
    Text,
    Boolean,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Timestamp,
    TimestampTz,
    Date,
    Unrecognized,
}

impl Decoder {
    fn for_type(ty: &Type) -> Self {
        if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
            Decoder::Text
        } else if *ty == Type::BOOL {
            Decoder::Boolean
        } else if *ty == Type::INT2 {
            Decoder::Int2
        } else if *ty == Type::INT4 {
            Decoder::Int4
        } else if *ty == Type::INT8 {
            Decoder::Int8
        } else if *ty == Type::FLOAT4 {
            Decoder::Float4
        } else if *ty == Type::FLOAT8 {
            Decoder::Float8
        } else if *ty == Type::TIMESTAMP {
            Decoder::Timestamp
        } else if *ty == Type::TIMESTAMPTZ {
            Decoder::TimestampTz
        } else if *ty == Type::DATE {
            Decoder::Date
        } else {
            Decoder::Unrecognized
        }
    }
}

fn column_value(row: &Row, idx: usize, ty: &Type) -> Result<ColumnValue> {
    let value = match Decoder::for_type(ty) {
        Decoder::Text => row.try_get::<_, Option<String>>(idx)?.map(ColumnValue::Text),
        Decoder::Boolean => row.try_get::<_, Option<bool>>(idx)?.map(ColumnValue::Boolean),
        Decoder::Int2 => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|i| ColumnValue::Integer(i.into())),
        Decoder::Int4 => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|i| ColumnValue::Integer(i.into())),
        Decoder::Int8 => row.try_get::<_, Option<i64>>(idx)?.map(ColumnValue::Integer),
        Decoder::Float4 => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|f| ColumnValue::Float(f.into())),
        Decoder::Float8 => row.try_get::<_, Option<f64>>(idx)?.map(ColumnValue::Float),
        Decoder::Timestamp => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|t| ColumnValue::Timestamp(naive_utc(t))),
        Decoder::TimestampTz => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(|t| ColumnValue::Timestamp(t.fixed_offset())),
        Decoder::Date => row
            .try_get::<_, Option<NaiveDate>>(idx)?
            .map(|d| ColumnValue::Timestamp(utc_midnight(d))),
        Decoder::Unrecognized => row
            .try_get::<_, Option<Unrecognized>>(idx)?
            .map(|_| ColumnValue::Other(ty.name().to_string())),
    };
    Ok(value.unwrap_or(ColumnValue::Null))
}

/// `timestamp without time zone` values are read as UTC.
fn naive_utc(t: NaiveDateTime) -> DateTime<FixedOffset> {
    t.and_utc().fixed_offset()
}

fn utc_midnight(date: NaiveDate) -> DateTime<FixedOffset> {
    naive_utc(date.and_time(NaiveTime::MIN))
}
