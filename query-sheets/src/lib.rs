pub mod encode;
pub mod sheets;
pub mod source;
pub mod sync;
pub mod value;

pub use encode::{
    build_payload, encode_header, encode_row, EncodeOptions, GridDims, UpdateMode, UpdatePayload,
};
pub use source::{QueryResult, QuerySource};
pub use sync::{SyncJob, SyncSummary};
pub use value::{encode_value, Cell, ColumnValue, Row};

use duckdb::Error as DuckDBError;
use postgres::Error as PostgresError;

pub type Result<T, E = QuerySheetsError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum QuerySheetsError {
    #[error("{msg}")]
    Internal { msg: String },
    #[error("No columns in result.")]
    NoColumns,
    #[error("{msg}")]
    Auth { msg: String },
    #[error("{msg}")]
    Sheets { status: u16, msg: String },
    #[error("{msg}")]
    Io { msg: String, source: std::io::Error },
    #[error("{msg}")]
    Json { msg: String, source: serde_json::Error },
    #[error("{msg}")]
    Http { msg: String, source: reqwest::Error },
    #[error("{msg}")]
    DuckDB { msg: String, source: DuckDBError },
    #[error("{msg}")]
    Postgres { msg: String, source: PostgresError },
}

impl QuerySheetsError {
    /// Wraps an I/O error with the path that caused it.
    pub fn io(context: impl std::fmt::Display, e: std::io::Error) -> Self {
        QuerySheetsError::Io {
            msg: format!("{}: {}", context, e),
            source: e,
        }
    }
}

impl From<std::io::Error> for QuerySheetsError {
    fn from(e: std::io::Error) -> Self {
        QuerySheetsError::Io {
            msg: format!("IO error: {}", e),
            source: e,
        }
    }
}

impl From<serde_json::Error> for QuerySheetsError {
    fn from(e: serde_json::Error) -> Self {
        QuerySheetsError::Json {
            msg: format!("JSON error: {}", e),
            source: e,
        }
    }
}

impl From<reqwest::Error> for QuerySheetsError {
    fn from(e: reqwest::Error) -> Self {
        QuerySheetsError::Http {
            msg: format!("HTTP error: {}", e),
            source: e,
        }
    }
}

impl From<DuckDBError> for QuerySheetsError {
    fn from(e: DuckDBError) -> Self {
        QuerySheetsError::DuckDB {
            msg: format!("DuckDB error: {}", e),
            source: e,
        }
    }
}

impl From<PostgresError> for QuerySheetsError {
    fn from(e: PostgresError) -> Self {
        QuerySheetsError::Postgres {
            msg: format!("Postgres error: {}", e),
            source: e,
        }
    }
}
