//! Google Sheets v4 `batchUpdate` request bodies.
//!
//! See <https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets/request>.

pub mod auth;
pub mod client;

pub use auth::{AccessToken, ClientSecret, TokenStore};
pub use client::{SheetsClient, SheetsService};

use serde::Serialize;

use crate::encode::UpdatePayload;
use crate::value::{Cell, Row};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const USER_ENTERED_VALUE: &str = "userEnteredValue";
const GRID_SIZE_FIELDS: &str = "gridProperties(rowCount,columnCount)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchUpdateSpreadsheetRequest {
    pub requests: Vec<Request>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    UpdateSheetProperties(UpdateSheetPropertiesRequest),
    UpdateCells(UpdateCellsRequest),
    AppendCells(AppendCellsRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateSheetPropertiesRequest {
    pub fields: &'static str,
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub grid_properties: GridProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    pub row_count: i64,
    pub column_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCellsRequest {
    pub fields: &'static str,
    pub start: GridCoordinate,
    pub rows: Vec<RowData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCoordinate {
    pub sheet_id: i64,
    pub row_index: i64,
    pub column_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendCellsRequest {
    pub fields: &'static str,
    pub sheet_id: i64,
    pub rows: Vec<RowData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowData {
    pub values: Vec<CellData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_value: Cell,
}

impl From<Row> for RowData {
    fn from(row: Row) -> Self {
        RowData {
            values: row
                .into_iter()
                .map(|cell| CellData {
                    user_entered_value: cell,
                })
                .collect(),
        }
    }
}

fn row_data(rows: Vec<Row>) -> Vec<RowData> {
    rows.into_iter().map(RowData::from).collect()
}

impl UpdatePayload {
    /// Builds the requests for one `batchUpdate` call against `sheet_id`.
    pub fn into_batch_request(self, sheet_id: i64) -> BatchUpdateSpreadsheetRequest {
        let requests = match self {
            UpdatePayload::Replace { dims, rows } => vec![
                Request::UpdateSheetProperties(UpdateSheetPropertiesRequest {
                    fields: GRID_SIZE_FIELDS,
                    properties: SheetProperties {
                        sheet_id,
                        grid_properties: GridProperties {
                            row_count: dims.rows as i64,
                            column_count: dims.columns as i64,
                        },
                    },
                }),
                Request::UpdateCells(UpdateCellsRequest {
                    fields: USER_ENTERED_VALUE,
                    start: GridCoordinate {
                        sheet_id,
                        row_index: 0,
                        column_index: 0,
                    },
                    rows: row_data(rows),
                }),
            ],
            UpdatePayload::Append { rows } => vec![Request::AppendCells(AppendCellsRequest {
                fields: USER_ENTERED_VALUE,
                sheet_id,
                rows: row_data(rows),
            })],
        };
        BatchUpdateSpreadsheetRequest { requests }
    }
}
