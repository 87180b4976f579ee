//! Row-insert transport: bulk-capable, duplicate-tolerant REST inserts.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{ItemOutcome, Transport};
use crate::models::Submission;
use crate::{Error, Result};

/// Postgres unique-key violation; re-delivery of an already-accepted row.
pub const DUPLICATE_KEY_CODE: &str = "23505";

const SUBMISSIONS_TABLE: &str = "submissions";

/// REST client inserting submission rows into a remote database table.
///
/// Inserts request insert-or-ignore semantics: a previously accepted ID must
/// neither error nor overwrite the stored row.
#[derive(Debug, Clone)]
pub struct RowInsertTransport {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl RowInsertTransport {
    /// Build a transport for the given database base URL and anon API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(Error::InvalidConfig(
                "database API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            endpoint: format!("{base_url}/rest/v1/{SUBMISSIONS_TABLE}?on_conflict=id"),
            api_key,
            client: reqwest::Client::builder().build()?,
        })
    }

    /// Fully resolved insert endpoint, for diagnostics
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn insert<B: Serialize + ?Sized>(&self, body: &B) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(parse_error_body(status, &body))
    }
}

impl Transport for RowInsertTransport {
    fn batch_capable(&self) -> bool {
        true
    }

    async fn send_batch(&self, batch: &[Submission]) -> Result<()> {
        self.insert(batch).await
    }

    async fn send_one(&self, submission: &Submission) -> Result<ItemOutcome> {
        match self.insert(submission).await {
            Ok(()) => Ok(ItemOutcome::Accepted),
            Err(Error::Api { ref code, .. }) if code == DUPLICATE_KEY_CODE => {
                Ok(ItemOutcome::Duplicate)
            }
            Err(error) => Err(error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

fn parse_error_body(status: StatusCode, body: &str) -> Error {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        let code = payload
            .code
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| format!("http_{}", status.as_u16()));
        let message = payload
            .message
            .or(payload.details)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Error::Api { code, message };
    }

    let trimmed = body.trim();
    Error::Api {
        code: format!("http_{}", status.as_u16()),
        message: if trimmed.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            trimmed.to_string()
        },
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidConfig(
            "database URL must not be empty".to_string(),
        ));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidConfig(
            "database URL must include http:// or https://".to_string(),
        ))
    }
}
