//! Database backends that produce [`ColumnValue`] rows.

pub mod duckdb;
pub mod postgres;

use tracing::debug;

use crate::value::ColumnValue;
use crate::Result;

/// Column names and every row of a finished query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ColumnValue>>,
}

pub trait QuerySource {
    fn query(&mut self, sql: &str) -> Result<QueryResult>;
}

/// Opens the backend a connection string points at.
///
/// `postgres://` and `postgresql://` URLs go to PostgreSQL. Anything else is
/// a DuckDB database path, with an empty string or `:memory:` meaning an
/// in-memory database.
pub fn open(dsn: &str) -> Result<Box<dyn QuerySource>> {
    if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
        debug!("Opening PostgreSQL connection");
        Ok(Box::new(postgres::PostgresSource::connect(dsn)?))
    } else {
        debug!(path = dsn, "Opening DuckDB database");
        Ok(Box::new(duckdb::DuckDBSource::open(dsn)?))
    }
}

/// Splits a SQL script into the statements before the last one and the last
/// statement, whose rows are the query result.
///
/// Semicolons inside quotes and comments do not end a statement. Dollar-quoted
/// bodies are not recognised.
pub fn split_last_statement(sql: &str) -> (Option<&str>, &str) {
    let mut body = sql.trim_end();
    while let Some(stripped) = body.strip_suffix(';') {
        body = stripped.trim_end();
    }

    let mut last_end = None;
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !bytes[i..].starts_with(b"*/") {
                    i += 1;
                }
                i += 1;
            }
            b';' => last_end = Some(i),
            _ => {}
        }
        i += 1;
    }

    match last_end {
        Some(end) => {
            let leading = body[..=end].trim();
            let last = body[end + 1..].trim();
            let only_separators = leading
                .chars()
                .all(|c| c == ';' || c.is_whitespace());
            ((!only_separators).then_some(leading), last)
        }
        None => (None, body.trim()),
    }
}
