//! reefpledge-core - Offline-tolerant submission queue and sync engine
//!
//! This crate persists pledge submissions to a durable local queue and
//! drains it in the background against a remote transport (a bulk-capable
//! row-insert database API or a per-item webhook), surviving page reloads,
//! network loss, and duplicate re-delivery. The UI collaborator only ever
//! enqueues; delivery is fire-and-forget.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod models;
pub mod queue;
pub mod sync;
pub mod transport;

use std::sync::Arc;

pub use config::Config;
pub use connectivity::Connectivity;
pub use error::{Error, Result};
pub use models::{Submission, SubmissionId};
pub use queue::{EnqueueOutcome, QueueStore, SubmissionQueue};
pub use sync::{PassOutcome, SyncEngine, SyncHandle, SyncTrigger};

/// Wire up the queue and, when a transport is configured, the background
/// sync loop. Must be called within a Tokio runtime when sync is configured.
///
/// With no transport credentials this degrades to queue-only operation:
/// submissions still persist locally, nothing is sent, and the degradation
/// is logged once.
pub fn bootstrap(
    config: &Config,
    connectivity: Connectivity,
) -> Result<(SubmissionQueue, Option<SyncHandle>)> {
    let store = Arc::new(QueueStore::new(config.queue_path.clone()));

    let Some(transport) = config.build_transport()? else {
        tracing::warn!("sync credentials not found; offline queue will persist but not sync");
        let queue = SubmissionQueue::new(store, connectivity, SyncTrigger::disabled());
        return Ok((queue, None));
    };

    let engine = Arc::new(
        SyncEngine::new(Arc::clone(&store), transport).with_send_delay(config.send_delay),
    );
    let handle = engine.start(connectivity.clone(), config.sync_interval);
    let queue = SubmissionQueue::new(store, connectivity, handle.trigger());

    Ok((queue, Some(handle)))
}
