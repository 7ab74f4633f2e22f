use std::fs;
use std::path::PathBuf;

use clap::Parser;

use query_sheets::sheets::{ClientSecret, SheetsClient, TokenStore};
use query_sheets::{source, EncodeOptions, QuerySheetsError, SyncJob, UpdateMode};
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(long, env = "DATABASE_URL", help = "Database connection string")]
    dsn: String,
    #[clap(long, help = "SQL file to execute")]
    query: PathBuf,
    #[clap(long, help = "Spreadsheet ID string")]
    spreadsheet: String,
    #[clap(long, default_value_t = 0, help = "Sheet ID integer")]
    sheet: i64,
    #[clap(long, help = "Append to spreadsheet, not overwrite")]
    append: bool,
    #[clap(long, default_value = "credentials.json", help = "Credentials file")]
    credentials: PathBuf,
    #[clap(long, default_value = "token.json", help = "Token storage file")]
    token: PathBuf,
    #[clap(long, help = "Include header in result")]
    header: bool,
}

impl Args {
    fn job(&self) -> SyncJob {
        SyncJob {
            spreadsheet_id: self.spreadsheet.clone(),
            sheet_id: self.sheet,
            options: EncodeOptions {
                mode: if self.append {
                    UpdateMode::Append
                } else {
                    UpdateMode::Replace
                },
                include_header: self.header,
            },
        }
    }

    // The DSN may carry a password, so only the target is recorded.
    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet, sheet = self.sheet))]
    pub fn run(&self) -> Result<(), QuerySheetsError> {
        let mut source = source::open(&self.dsn)?;

        let sql = fs::read_to_string(&self.query).map_err(|e| {
            QuerySheetsError::io(
                format!("Unable to read query file {}", self.query.display()),
                e,
            )
        })?;

        let secret = ClientSecret::from_file(&self.credentials)?;
        let mut store = TokenStore::load(&self.token)?;
        let client = SheetsClient::authorize(&secret, &mut store)?;

        self.job().run(&mut *source, &sql, &client)?;
        Ok(())
    }
}

fn main() -> Result<(), QuerySheetsError> {
    tracing_subscriber::fmt::init();
    Args::parse().run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            "query-sheets",
            "--dsn",
            ":memory:",
            "--query",
            "report.sql",
            "--spreadsheet",
            "abc",
        ])
        .expect("Failed to parse args");

        assert_eq!(args.credentials, PathBuf::from("credentials.json"));
        assert_eq!(args.token, PathBuf::from("token.json"));
        let job = args.job();
        assert_eq!(job.sheet_id, 0);
        assert_eq!(job.options.mode, UpdateMode::Replace);
        assert!(!job.options.include_header);
    }

    #[test]
    fn test_append_flag() {
        let args = Args::try_parse_from([
            "query-sheets",
            "--dsn",
            "postgres://localhost/db",
            "--query",
            "report.sql",
            "--spreadsheet",
            "abc",
            "--sheet",
            "12",
            "--append",
            "--header",
        ])
        .expect("Failed to parse args");

        let job = args.job();
        assert_eq!(job.sheet_id, 12);
        assert_eq!(job.options.mode, UpdateMode::Append);
        assert!(!job.options.emits_header());
    }
}
