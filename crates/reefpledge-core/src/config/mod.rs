//! Environment-driven configuration for queue storage and sync transports.
//!
//! Transport credentials gate whether the sync engine runs at all: a missing
//! pair degrades to "queue-only, no sync" rather than erroring, while a
//! partial database pair (URL without key, or key without URL) is rejected.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::queue::QUEUE_FILE_NAME;
use crate::sync::{DEFAULT_SEND_DELAY, DEFAULT_SYNC_INTERVAL};
use crate::transport::{ConfiguredTransport, RowInsertTransport, WebhookTransport};
use crate::{Error, Result};

const ENV_DATABASE_URL: &str = "REEFPLEDGE_DATABASE_URL";
const ENV_DATABASE_KEY: &str = "REEFPLEDGE_DATABASE_KEY";
const ENV_WEBHOOK_URL: &str = "REEFPLEDGE_WEBHOOK_URL";
const ENV_QUEUE_PATH: &str = "REEFPLEDGE_QUEUE_PATH";

/// Runtime configuration for the queue and sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the persisted queue file
    pub queue_path: PathBuf,
    /// Row-insert database base URL
    pub database_url: Option<String>,
    /// Row-insert database API key
    pub database_key: Option<String>,
    /// Per-item webhook URL
    pub webhook_url: Option<String>,
    /// Interval between timer-driven background passes
    pub sync_interval: Duration,
    /// Delay between sequential per-item sends
    pub send_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_path: PathBuf::from(QUEUE_FILE_NAME),
            database_url: None,
            database_key: None,
            webhook_url: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            send_delay: DEFAULT_SEND_DELAY,
        }
    }
}

impl Config {
    /// Load configuration from `REEFPLEDGE_*` environment variables.
    ///
    /// Absent transport credentials are not an error; a partial database
    /// pair is.
    pub fn from_env() -> Result<Self> {
        Self::parse(|key| env::var(key).ok())
    }

    fn parse(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = normalize_value(lookup(ENV_DATABASE_URL));
        let database_key = normalize_value(lookup(ENV_DATABASE_KEY));

        match (&database_url, &database_key) {
            (Some(_), None) => {
                return Err(Error::InvalidConfig(format!(
                    "{ENV_DATABASE_KEY} is required when {ENV_DATABASE_URL} is set"
                )));
            }
            (None, Some(_)) => {
                return Err(Error::InvalidConfig(format!(
                    "{ENV_DATABASE_URL} is required when {ENV_DATABASE_KEY} is set"
                )));
            }
            _ => {}
        }

        let queue_path = normalize_value(lookup(ENV_QUEUE_PATH))
            .map_or_else(|| PathBuf::from(QUEUE_FILE_NAME), PathBuf::from);

        Ok(Self {
            queue_path,
            database_url,
            database_key,
            webhook_url: normalize_value(lookup(ENV_WEBHOOK_URL)),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            send_delay: DEFAULT_SEND_DELAY,
        })
    }

    /// Whether any transport is configured
    #[must_use]
    pub const fn is_sync_configured(&self) -> bool {
        (self.database_url.is_some() && self.database_key.is_some())
            || self.webhook_url.is_some()
    }

    /// Build the configured transport variant.
    ///
    /// The row-insert database wins when both transports are configured;
    /// `Ok(None)` means queue-only operation.
    pub fn build_transport(&self) -> Result<Option<ConfiguredTransport>> {
        if let (Some(url), Some(key)) = (&self.database_url, &self.database_key) {
            let transport = RowInsertTransport::new(url, key)?;
            return Ok(Some(ConfiguredTransport::RowInsert(transport)));
        }

        if let Some(url) = &self.webhook_url {
            let transport = WebhookTransport::new(url)?;
            return Ok(Some(ConfiguredTransport::Webhook(transport)));
        }

        Ok(None)
    }
}

fn normalize_value(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn parse_defaults_when_nothing_is_set() {
        let config = Config::parse(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.is_sync_configured());
    }

    #[test]
    fn parse_rejects_partial_database_pair() {
        let error = Config::parse(lookup_from(&[(
            ENV_DATABASE_URL,
            "https://project.supabase.co",
        )]))
        .unwrap_err();
        assert!(error.to_string().contains(ENV_DATABASE_KEY));

        let error = Config::parse(lookup_from(&[(ENV_DATABASE_KEY, "anon")])).unwrap_err();
        assert!(error.to_string().contains(ENV_DATABASE_URL));
    }

    #[test]
    fn parse_treats_blank_values_as_absent() {
        let config = Config::parse(lookup_from(&[
            (ENV_DATABASE_URL, "  "),
            (ENV_WEBHOOK_URL, ""),
        ]))
        .unwrap();
        assert!(!config.is_sync_configured());
    }

    #[test]
    fn parse_honors_queue_path_override() {
        let config =
            Config::parse(lookup_from(&[(ENV_QUEUE_PATH, "/var/lib/reefpledge/queue.json")]))
                .unwrap();
        assert_eq!(
            config.queue_path,
            PathBuf::from("/var/lib/reefpledge/queue.json")
        );
    }

    #[test]
    fn build_transport_returns_none_when_unconfigured() {
        let config = Config::default();
        assert!(config.build_transport().unwrap().is_none());
    }

    #[test]
    fn build_transport_prefers_database_over_webhook() {
        let config = Config {
            database_url: Some("https://project.supabase.co".to_string()),
            database_key: Some("anon".to_string()),
            webhook_url: Some("https://script.example.com/exec".to_string()),
            ..Config::default()
        };

        let transport = config.build_transport().unwrap().unwrap();
        assert!(matches!(transport, ConfiguredTransport::RowInsert(_)));
    }

    #[test]
    fn build_transport_uses_webhook_when_database_is_absent() {
        let config = Config {
            webhook_url: Some("https://script.example.com/exec".to_string()),
            ..Config::default()
        };

        let transport = config.build_transport().unwrap().unwrap();
        assert!(matches!(transport, ConfiguredTransport::Webhook(_)));
    }

    #[test]
    fn build_transport_surfaces_invalid_urls() {
        let config = Config {
            webhook_url: Some("script.example.com/exec".to_string()),
            ..Config::default()
        };
        assert!(config.build_transport().is_err());
    }
}
