//! Sync engine: drains the durable queue against a delivery transport.
//!
//! A pass snapshots the persisted queue, attempts a bulk delivery when the
//! transport supports one (falling back to sequential per-item delivery),
//! and removes only the confirmed IDs from the freshly re-read queue.
//! At most one pass is ever in flight; overlapping triggers are no-ops.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::connectivity::Connectivity;
use crate::models::{Submission, SubmissionId};
use crate::queue::QueueStore;
use crate::transport::{ConfiguredTransport, ItemOutcome, Transport};

/// Default interval between timer-driven background passes.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Default delay between sequential per-item sends.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(200);

/// Structured result of one sync pass, readable by a diagnostic surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass was in flight; nothing was done
    AlreadyRunning,
    /// The queue snapshot was empty; no network call was made
    QueueEmpty,
    /// The pass ran to completion
    Completed {
        /// Entries confirmed delivered (or already known remotely) and
        /// removed from the queue
        delivered: usize,
        /// Entries still queued after the pass
        remaining: usize,
    },
}

/// Drains the durable queue against a delivery transport.
pub struct SyncEngine<T> {
    store: Arc<QueueStore>,
    transport: T,
    send_delay: Duration,
    in_flight: AtomicBool,
}

impl<T: Transport> SyncEngine<T> {
    /// Create an engine over the given store and transport
    pub fn new(store: Arc<QueueStore>, transport: T) -> Self {
        Self {
            store,
            transport,
            send_delay: DEFAULT_SEND_DELAY,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Override the delay between sequential per-item sends
    #[must_use]
    pub const fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Run one drain pass.
    ///
    /// Items enqueued after the snapshot is taken are not part of this pass;
    /// they are picked up by the next trigger. Failed items stay queued with
    /// no retry cap.
    pub async fn run_pass(&self) -> PassOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sync pass already in flight; skipping");
            return PassOutcome::AlreadyRunning;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let batch = self.store.pending();
        if batch.is_empty() {
            return PassOutcome::QueueEmpty;
        }

        tracing::info!(count = batch.len(), "syncing queued submissions");
        let delivered = self.deliver(&batch).await;

        if !delivered.is_empty() {
            let ids: HashSet<SubmissionId> = delivered.iter().copied().collect();
            let removed = self.store.remove(&ids);
            tracing::info!(count = removed, "synced submissions removed from queue");
        }

        PassOutcome::Completed {
            delivered: delivered.len(),
            remaining: self.store.pending().len(),
        }
    }

    async fn deliver(&self, batch: &[Submission]) -> Vec<SubmissionId> {
        if self.transport.batch_capable() {
            match self.transport.send_batch(batch).await {
                Ok(()) => return batch.iter().map(|submission| submission.id).collect(),
                Err(error) => {
                    tracing::warn!(%error, "bulk delivery failed; retrying items sequentially");
                }
            }
        }
        self.deliver_sequential(batch).await
    }

    async fn deliver_sequential(&self, batch: &[Submission]) -> Vec<SubmissionId> {
        let mut delivered = Vec::new();

        for (index, submission) in batch.iter().enumerate() {
            if index > 0 {
                // Pace sequential sends so the remote endpoint is not hammered
                tokio::time::sleep(self.send_delay).await;
            }

            match self.transport.send_one(submission).await {
                Ok(ItemOutcome::Accepted) => {
                    tracing::debug!(id = %submission.id, "submission delivered");
                    delivered.push(submission.id);
                }
                Ok(ItemOutcome::Duplicate) => {
                    tracing::debug!(id = %submission.id, "submission already accepted remotely");
                    delivered.push(submission.id);
                }
                Err(error) => {
                    tracing::warn!(
                        id = %submission.id,
                        student = %submission.student_name,
                        %error,
                        "delivery failed; submission stays queued"
                    );
                }
            }
        }

        delivered
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fire-and-forget request for a sync pass.
///
/// Backed by a bounded channel: a full channel means a pass is already
/// requested, and a disabled trigger (no transport configured) drops
/// requests silently.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    tx: Option<mpsc::Sender<()>>,
}

impl SyncTrigger {
    /// A trigger that drops every request; used when sync is unconfigured
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Whether requests reach a running sync loop
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Request a pass without waiting for it
    pub fn request_pass(&self) {
        if let Some(tx) = &self.tx {
            // A full channel already holds a pending request
            let _ = tx.try_send(());
        }
    }
}

/// Handle over the background sync loop.
///
/// Dropping the handle (or calling [`SyncHandle::shutdown`]) stops future
/// passes; a pass already in flight runs to completion.
pub struct SyncHandle {
    trigger: SyncTrigger,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Clonable trigger for wiring into the enqueue path
    #[must_use]
    pub fn trigger(&self) -> SyncTrigger {
        self.trigger.clone()
    }

    /// Request a pass now (manual/diagnostic trigger)
    pub fn request_pass(&self) {
        self.trigger.request_pass();
    }

    /// Stop the loop and wait for it to wind down
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl SyncEngine<ConfiguredTransport> {
    /// Start the background sync loop: an immediate pass, a recurring
    /// timer-driven pass while online, a pass on every connectivity-restored
    /// edge, and on-demand passes via the returned handle's trigger.
    pub fn start(self: &Arc<Self>, connectivity: Connectivity, sync_interval: Duration) -> SyncHandle {
        let (trigger_tx, mut trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut online_rx = connectivity.subscribe();
        let engine = Arc::clone(self);

        let task = tokio::spawn(async move {
            engine.run_pass().await;

            let mut ticker = interval_at(Instant::now() + sync_interval, sync_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        if connectivity.is_online() {
                            engine.run_pass().await;
                        }
                    }
                    changed = online_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if *online_rx.borrow_and_update() {
                            tracing::info!("connectivity restored; syncing");
                            engine.run_pass().await;
                        }
                    }
                    Some(()) = trigger_rx.recv() => {
                        engine.run_pass().await;
                    }
                }
            }
        });

        SyncHandle {
            trigger: SyncTrigger {
                tx: Some(trigger_tx),
            },
            shutdown: shutdown_tx,
            task,
        }
    }
}
