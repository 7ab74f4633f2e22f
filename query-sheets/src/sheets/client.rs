use reqwest::blocking::Client;
use tracing::debug;

use super::auth::{ClientSecret, TokenStore};
use super::BatchUpdateSpreadsheetRequest;
use crate::{QuerySheetsError, Result};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Something that can apply a batch update to a spreadsheet.
pub trait SheetsService {
    fn batch_update(
        &self,
        spreadsheet_id: &str,
        request: &BatchUpdateSpreadsheetRequest,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl SheetsClient {
    pub fn new(http: Client, access_token: impl Into<String>) -> Self {
        SheetsClient {
            http,
            access_token: access_token.into(),
            base_url: SHEETS_API.to_string(),
        }
    }

    /// Builds a client from a stored token, refreshing it if it expired.
    pub fn authorize(secret: &ClientSecret, store: &mut TokenStore) -> Result<Self> {
        let http = Client::new();
        let access_token = store.fresh_token(secret, &http)?.access_token.clone();
        Ok(Self::new(http, access_token))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn batch_update_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/{}:batchUpdate",
            self.base_url.trim_end_matches('/'),
            spreadsheet_id
        )
    }
}

impl SheetsService for SheetsClient {
    fn batch_update(
        &self,
        spreadsheet_id: &str,
        request: &BatchUpdateSpreadsheetRequest,
    ) -> Result<()> {
        let url = self.batch_update_url(spreadsheet_id);
        debug!(%url, requests = request.requests.len(), "Sending batch update");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(request)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(QuerySheetsError::Sheets {
                status: status.as_u16(),
                msg: format!("Unable to update spreadsheet ({}): {}", status, body),
            });
        }
        Ok(())
    }
}
