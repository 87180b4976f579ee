//! Delivery transports for queued submissions.
//!
//! One capability, two variants: a bulk-capable row-insert database API and
//! a per-item webhook. The sync engine's retry/fallback algorithm is written
//! once against [`Transport`]; configuration selects the variant at startup.

mod row_insert;
mod webhook;

pub use row_insert::{RowInsertTransport, DUPLICATE_KEY_CODE};
pub use webhook::WebhookTransport;

use crate::models::Submission;
use crate::Result;

/// Per-item delivery outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The remote accepted and stored the submission
    Accepted,
    /// The remote already has this ID; confirmation of a prior success
    Duplicate,
}

/// A backend that accepts submission records.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Whether [`Transport::send_batch`] is available
    fn batch_capable(&self) -> bool;

    /// Deliver a whole batch in one duplicate-tolerant call
    async fn send_batch(&self, batch: &[Submission]) -> Result<()>;

    /// Deliver a single submission
    async fn send_one(&self, submission: &Submission) -> Result<ItemOutcome>;
}

/// The transport variant selected by configuration at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredTransport {
    /// Bulk-capable row-insert database API
    RowInsert(RowInsertTransport),
    /// Per-item webhook endpoint
    Webhook(WebhookTransport),
}

impl Transport for ConfiguredTransport {
    fn batch_capable(&self) -> bool {
        match self {
            Self::RowInsert(transport) => transport.batch_capable(),
            Self::Webhook(transport) => transport.batch_capable(),
        }
    }

    async fn send_batch(&self, batch: &[Submission]) -> Result<()> {
        match self {
            Self::RowInsert(transport) => transport.send_batch(batch).await,
            Self::Webhook(transport) => transport.send_batch(batch).await,
        }
    }

    async fn send_one(&self, submission: &Submission) -> Result<ItemOutcome> {
        match self {
            Self::RowInsert(transport) => transport.send_one(submission).await,
            Self::Webhook(transport) => transport.send_one(submission).await,
        }
    }
}
