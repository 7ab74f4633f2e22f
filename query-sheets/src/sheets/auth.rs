//! OAuth client secrets and stored user tokens.
//!
//! The token file is produced once by an interactive consent flow that this
//! crate does not implement. Afterwards the stored refresh token keeps the
//! access token current, and the refreshed token is written back.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{QuerySheetsError, Result};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to their expiry are treated as expired.
const EXPIRY_DELTA_SECS: i64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Layout of the JSON downloaded from the cloud console.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    #[serde(alias = "web")]
    installed: ClientSecret,
}

impl ClientSecret {
    pub fn try_from_str(input: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(input).map_err(|e| {
            QuerySheetsError::Auth {
                msg: format!("Unable to parse client secret file to config: {}", e),
            }
        })?;
        Ok(file.installed)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|e| {
            QuerySheetsError::io(
                format!("Unable to read client secret file {}", path.display()),
                e,
            )
        })?;
        Self::try_from_str(&input)
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// A missing expiry, or the year-one placeholder some tools write, never
    /// expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry.filter(|t| t.year() > 1)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at() {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_DELTA_SECS) > now,
            None => true,
        }
    }

    fn merge(&mut self, resp: TokenResponse, now: DateTime<Utc>) {
        self.access_token = resp.access_token;
        if let Some(token_type) = resp.token_type {
            self.token_type = token_type;
        }
        if let Some(refresh_token) = resp.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.expiry = resp.expires_in.map(|secs| now + Duration::seconds(secs));
    }
}

/// Body returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub trait TokenEndpoint {
    fn refresh(&self, secret: &ClientSecret, refresh_token: &str) -> Result<TokenResponse>;
}

impl TokenEndpoint for reqwest::blocking::Client {
    fn refresh(&self, secret: &ClientSecret, refresh_token: &str) -> Result<TokenResponse> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ];
        debug!(uri = secret.token_uri(), "Refreshing access token");
        let resp = self.post(secret.token_uri()).form(&params).send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(QuerySheetsError::Auth {
                msg: format!("Token refresh failed with status {}: {}", status, body),
            });
        }
        Ok(resp.json()?)
    }
}

/// A token file on disk and its parsed contents.
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    token: AccessToken,
}

impl TokenStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let input = match fs::read_to_string(&path) {
            Ok(input) => input,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QuerySheetsError::Auth {
                    msg: format!(
                        "Token file {} not found; authorize the client for scope {} first",
                        path.display(),
                        super::SPREADSHEETS_SCOPE
                    ),
                })
            }
            Err(e) => {
                return Err(QuerySheetsError::io(
                    format!("Unable to read token file {}", path.display()),
                    e,
                ))
            }
        };
        let token = serde_json::from_str(&input)?;
        Ok(TokenStore { path, token })
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Returns an access token that is valid now, refreshing and saving it
    /// first when needed.
    pub fn fresh_token(
        &mut self,
        secret: &ClientSecret,
        endpoint: &dyn TokenEndpoint,
    ) -> Result<&AccessToken> {
        let now = Utc::now();
        if self.token.is_valid_at(now) {
            return Ok(&self.token);
        }

        let refresh_token = self
            .token
            .refresh_token
            .clone()
            .ok_or_else(|| QuerySheetsError::Auth {
                msg: format!(
                    "Access token in {} expired and has no refresh token",
                    self.path.display()
                ),
            })?;

        info!("Refreshing expired access token");
        let resp = endpoint.refresh(secret, &refresh_token)?;
        self.token.merge(resp, now);
        self.save()?;
        Ok(&self.token)
    }

    fn save(&self) -> Result<()> {
        let output = serde_json::to_string(&self.token)?;
        fs::write(&self.path, output).map_err(|e| {
            QuerySheetsError::io(format!("Unable to save token to {}", self.path.display()), e)
        })
    }
}
