use tracing::info;

use crate::encode::{build_payload, EncodeOptions, UpdateMode};
use crate::sheets::SheetsService;
use crate::source::{QueryResult, QuerySource};
use crate::Result;

/// Where one query's result goes and how it is written.
#[derive(Debug, Clone)]
pub struct SyncJob {
    pub spreadsheet_id: String,
    pub sheet_id: i64,
    pub options: EncodeOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub mode: UpdateMode,
    /// Rows written, header included.
    pub rows: usize,
    pub columns: usize,
}

impl SyncJob {
    pub fn run(
        &self,
        source: &mut dyn QuerySource,
        sql: &str,
        service: &dyn SheetsService,
    ) -> Result<SyncSummary> {
        info!("Executing query...");
        let QueryResult { columns, rows } = source.query(sql)?;
        let payload = build_payload(&columns, rows, &self.options)?;
        let summary = SyncSummary {
            mode: payload.mode(),
            rows: payload.rows().len(),
            columns: columns.len(),
        };

        info!(
            mode = %summary.mode,
            rows = summary.rows,
            columns = summary.columns,
            "Updating spreadsheet..."
        );
        let request = payload.into_batch_request(self.sheet_id);
        service.batch_update(&self.spreadsheet_id, &request)?;

        info!("Successfully written.");
        Ok(summary)
    }
}
