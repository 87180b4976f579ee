//! Durable local queue for pending submissions.
//!
//! The queue is a JSON array persisted under a single well-known file.
//! An absent or unreadable file reads as an empty queue; every mutation
//! re-reads and fully rewrites the snapshot under the store's lock, so
//! entries appended while a sync pass is in flight are never lost by the
//! pass's removal step.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::connectivity::Connectivity;
use crate::models::{Submission, SubmissionId};
use crate::sync::SyncTrigger;

/// Well-known file name for the persisted queue.
pub const QUEUE_FILE_NAME: &str = "offline_submission_queue.json";

/// Structured result of an enqueue attempt.
///
/// Storage failures are absorbed here rather than raised: the submission
/// flow must never crash the caller, but a diagnostic surface can still
/// observe that an item was not queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The submission was appended to the persisted queue
    Queued,
    /// An entry with the same ID already exists; nothing was written
    AlreadyQueued,
    /// The persisted queue could not be written; the submission was dropped
    StorageFailed(String),
}

/// Crash-safe storage of pending submissions.
///
/// The enqueue path is the only writer that appends; the sync engine is the
/// only writer that removes. Both go through the same read-modify-write
/// discipline under one lock.
#[derive(Debug)]
pub struct QueueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl QueueStore {
    /// Create a store persisting to the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create a store using [`QUEUE_FILE_NAME`] inside the given directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(QUEUE_FILE_NAME))
    }

    /// Path of the persisted queue file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current persisted queue contents.
    ///
    /// An absent, unreadable, or corrupt file reads as an empty queue;
    /// the failure is logged, never propagated.
    #[must_use]
    pub fn pending(&self) -> Vec<Submission> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Self::read_file(&self.path)
    }

    /// Append a submission unless an entry with the same ID already exists.
    pub fn enqueue(&self, submission: &Submission) -> EnqueueOutcome {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut queue = Self::read_file(&self.path);
        if queue.iter().any(|queued| queued.id == submission.id) {
            tracing::debug!(id = %submission.id, "submission already queued");
            return EnqueueOutcome::AlreadyQueued;
        }

        queue.push(submission.clone());
        match self.write_file(&queue) {
            Ok(()) => {
                tracing::info!(
                    id = %submission.id,
                    student = %submission.student_name,
                    "queued submission"
                );
                EnqueueOutcome::Queued
            }
            Err(error) => {
                tracing::warn!(id = %submission.id, %error, "failed to persist queue");
                EnqueueOutcome::StorageFailed(error.to_string())
            }
        }
    }

    /// Remove entries whose ID is in the given set, preserving everything
    /// appended since the caller's snapshot was taken. Returns the number of
    /// entries removed.
    pub fn remove(&self, ids: &HashSet<SubmissionId>) -> usize {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let queue = Self::read_file(&self.path);
        let before = queue.len();
        let remaining: Vec<Submission> = queue
            .into_iter()
            .filter(|queued| !ids.contains(&queued.id))
            .collect();
        let removed = before - remaining.len();

        if removed > 0 {
            if let Err(error) = self.write_file(&remaining) {
                // Leaving the entries in place only causes a redundant,
                // duplicate-tolerant re-delivery on the next pass.
                tracing::warn!(%error, "failed to persist queue after removal");
                return 0;
            }
        }
        removed
    }

    fn read_file(path: &Path) -> Vec<Submission> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to read queue file");
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(queue) => queue,
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "queue file is corrupt; treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Full-replace persistence: serialize the whole list, write to a
    /// sibling temp file, then rename over the previous snapshot.
    fn write_file(&self, queue: &[Submission]) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec(queue)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// The surface the UI collaborator consumes: persist a submission and
/// opportunistically request a sync pass.
#[derive(Debug, Clone)]
pub struct SubmissionQueue {
    store: Arc<QueueStore>,
    connectivity: Connectivity,
    trigger: SyncTrigger,
}

impl SubmissionQueue {
    /// Wire a facade over the given store, connectivity signal, and sync
    /// trigger. Use [`SyncTrigger::disabled`] when no transport is configured.
    #[must_use]
    pub fn new(store: Arc<QueueStore>, connectivity: Connectivity, trigger: SyncTrigger) -> Self {
        Self {
            store,
            connectivity,
            trigger,
        }
    }

    /// Persist a submission and, when online, request a background sync
    /// pass. Fire-and-forget: the caller never waits for delivery, and no
    /// failure from storage or sync is raised here.
    pub fn enqueue(&self, submission: &Submission) -> EnqueueOutcome {
        let outcome = self.store.enqueue(submission);

        if self.connectivity.is_online() {
            self.trigger.request_pass();
        }
        outcome
    }

    /// Snapshot of the persisted queue, for diagnostics
    #[must_use]
    pub fn pending(&self) -> Vec<Submission> {
        self.store.pending()
    }

    /// Shared handle to the underlying store
    #[must_use]
    pub fn store(&self) -> Arc<QueueStore> {
        Arc::clone(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_absent_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = QueueStore::in_dir(dir.path());
        assert_eq!(store.pending(), Vec::new());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = QueueStore::in_dir(dir.path());
        std::fs::write(store.path(), b"{not json").unwrap();
        assert_eq!(store.pending(), Vec::new());
    }

    #[test]
    fn test_enqueue_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let submission = Submission::new("Asha", "1", "a@b.c");
        {
            let store = QueueStore::in_dir(dir.path());
            assert_eq!(store.enqueue(&submission), EnqueueOutcome::Queued);
        }

        let reopened = QueueStore::in_dir(dir.path());
        assert_eq!(reopened.pending(), vec![submission]);
    }

    #[test]
    fn test_enqueue_is_idempotent_on_id() {
        let dir = tempdir().unwrap();
        let store = QueueStore::in_dir(dir.path());
        let submission = Submission::new("Asha", "1", "a@b.c");

        assert_eq!(store.enqueue(&submission), EnqueueOutcome::Queued);
        assert_eq!(store.enqueue(&submission), EnqueueOutcome::AlreadyQueued);
        assert_eq!(store.pending().len(), 1);
    }

    #[test]
    fn test_remove_is_set_difference_on_id() {
        let dir = tempdir().unwrap();
        let store = QueueStore::in_dir(dir.path());
        let keep = Submission::new("Keep", "1", "k@b.c");
        let synced = Submission::new("Synced", "2", "s@b.c");
        store.enqueue(&keep);
        store.enqueue(&synced);

        let removed = store.remove(&HashSet::from([synced.id]));
        assert_eq!(removed, 1);
        assert_eq!(store.pending(), vec![keep]);
    }

    #[test]
    fn test_remove_ignores_unknown_ids() {
        let dir = tempdir().unwrap();
        let store = QueueStore::in_dir(dir.path());
        let submission = Submission::new("Asha", "1", "a@b.c");
        store.enqueue(&submission);

        let removed = store.remove(&HashSet::from([SubmissionId::new()]));
        assert_eq!(removed, 0);
        assert_eq!(store.pending().len(), 1);
    }

    #[test]
    fn test_remove_reports_only_entries_actually_present() {
        let dir = tempdir().unwrap();
        let store = QueueStore::in_dir(dir.path());
        let queued = Submission::new("Asha", "1", "a@b.c");
        store.enqueue(&queued);

        // One id is queued, the other is unknown; the count must reflect
        // what was actually removed, not the size of the requested set
        let removed = store.remove(&HashSet::from([queued.id, SubmissionId::new()]));
        assert_eq!(removed, 1);
        assert!(store.pending().is_empty());
    }

    #[test]
    fn test_write_read_round_trip_is_lossless() {
        let dir = tempdir().unwrap();
        let store = QueueStore::in_dir(dir.path());
        let first = Submission::new("Asha", "1", "a@b.c").with_opt_in(true);
        let second = Submission::new("Ravi", "2", "r@b.c");
        store.enqueue(&first);
        store.enqueue(&second);

        assert_eq!(store.pending(), vec![first, second]);
        // The persisted file is itself a valid JSON array of wire records
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let parsed: Vec<Submission> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_facade_enqueue_with_disabled_trigger_still_persists() {
        let dir = tempdir().unwrap();
        let store = Arc::new(QueueStore::in_dir(dir.path()));
        let queue = SubmissionQueue::new(
            Arc::clone(&store),
            Connectivity::assume_online(),
            SyncTrigger::disabled(),
        );

        let submission = Submission::new("Asha", "1", "a@b.c");
        assert_eq!(queue.enqueue(&submission), EnqueueOutcome::Queued);
        assert_eq!(store.pending().len(), 1);
    }
}
