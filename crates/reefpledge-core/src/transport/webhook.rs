//! Webhook transport: one HTTP POST per submission, outcome in the body.

use serde::Deserialize;

use super::{ItemOutcome, Transport};
use crate::models::Submission;
use crate::{Error, Result};

// text/plain keeps browser-era compatibility with script-hosted webhook
// endpoints: the body is still JSON, but the request needs no CORS
// pre-flight round trip.
const WEBHOOK_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

const WEBHOOK_ERROR_CODE: &str = "webhook_error";

/// Per-item-only transport posting each submission to a webhook URL.
///
/// Success is signaled by a `status` field in the JSON response body, not by
/// the HTTP status code.
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    url: String,
    client: reqwest::Client,
}

impl WebhookTransport {
    /// Build a transport for the given webhook URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = normalize_url(url.into())?;
        Ok(Self {
            url,
            client: reqwest::Client::builder().build()?,
        })
    }

    /// Configured webhook URL, for diagnostics
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WebhookTransport {
    fn batch_capable(&self) -> bool {
        false
    }

    async fn send_batch(&self, _batch: &[Submission]) -> Result<()> {
        Err(Error::BatchUnsupported)
    }

    async fn send_one(&self, submission: &Submission) -> Result<ItemOutcome> {
        let body = serde_json::to_string(submission)?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, WEBHOOK_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let payload = response.text().await?;
        parse_webhook_response(&payload)
    }
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

fn parse_webhook_response(payload: &str) -> Result<ItemOutcome> {
    let response: WebhookResponse = serde_json::from_str(payload)?;
    if response.status == "success" {
        Ok(ItemOutcome::Accepted)
    } else {
        Err(Error::Api {
            code: WEBHOOK_ERROR_CODE.to_string(),
            message: response
                .message
                .unwrap_or_else(|| format!("webhook returned status '{}'", response.status)),
        })
    }
}

fn normalize_url(raw: String) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidConfig(
            "webhook URL must not be empty".to_string(),
        ));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(Error::InvalidConfig(
            "webhook URL must include http:// or https://".to_string(),
        ))
    }
}
