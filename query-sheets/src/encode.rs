use std::fmt::Display;

use crate::value::{encode_value, Cell, ColumnValue, Row};
use crate::{QuerySheetsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Resize the sheet and overwrite it from the top-left cell.
    #[default]
    Replace,
    /// Add rows after the existing content.
    Append,
}

impl Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateMode::Replace => write!(f, "replace"),
            UpdateMode::Append => write!(f, "append"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    pub mode: UpdateMode,
    /// Prepend the column names. Ignored in append mode.
    pub include_header: bool,
}

impl EncodeOptions {
    pub fn emits_header(&self) -> bool {
        self.include_header && self.mode == UpdateMode::Replace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePayload {
    Replace { dims: GridDims, rows: Vec<Row> },
    Append { rows: Vec<Row> },
}

impl UpdatePayload {
    pub fn mode(&self) -> UpdateMode {
        match self {
            UpdatePayload::Replace { .. } => UpdateMode::Replace,
            UpdatePayload::Append { .. } => UpdateMode::Append,
        }
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            UpdatePayload::Replace { rows, .. } | UpdatePayload::Append { rows } => rows,
        }
    }
}

pub fn encode_row(values: impl IntoIterator<Item = ColumnValue>) -> Row {
    values.into_iter().map(encode_value).collect()
}

pub fn encode_header<S: AsRef<str>>(names: &[S]) -> Row {
    names
        .iter()
        .map(|name| Cell::Text(name.as_ref().to_string()))
        .collect()
}

/// Encodes a whole result set into the payload for a single batch update.
///
/// Fails with [`QuerySheetsError::NoColumns`] before touching any row when
/// `columns` is empty.
pub fn build_payload<S, R>(
    columns: &[S],
    rows: impl IntoIterator<Item = R>,
    options: &EncodeOptions,
) -> Result<UpdatePayload>
where
    S: AsRef<str>,
    R: IntoIterator<Item = ColumnValue>,
{
    if columns.is_empty() {
        return Err(QuerySheetsError::NoColumns);
    }

    let mut encoded = Vec::new();
    if options.emits_header() {
        encoded.push(encode_header(columns));
    }
    encoded.extend(rows.into_iter().map(encode_row));

    let payload = match options.mode {
        UpdateMode::Replace => UpdatePayload::Replace {
            dims: GridDims {
                rows: encoded.len(),
                columns: columns.len(),
            },
            rows: encoded,
        },
        UpdateMode::Append => UpdatePayload::Append { rows: encoded },
    };
    Ok(payload)
}
