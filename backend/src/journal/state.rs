//! Tracks how far each admission submission got.
//!
//! The pipeline reports every completed stage as a `JournalUpdate` on an MPSC
//! channel. `start_journal_writer` is the only consumer: it persists each
//! status through the `JournalStore`, so a failed submission can be reconciled
//! by hand later (its completed side effects are never rolled back), and keeps
//! the unfinished attempts plus the most recently completed ones in the shared
//! `JournalState` map. Older completed attempts are read back from the store.

use super::store::JournalStore;
use common::jobs::{SubmissionStage, SubmissionStatus};
use log::{error, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, RwLock};

/// Completed attempts kept in memory after they are persisted.
const RECENT_COMPLETED: usize = 256;

pub type SharedStore = Arc<Mutex<JournalStore>>;

fn lock(store: &SharedStore) -> MutexGuard<'_, JournalStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A thread-safe, shareable view of every known submission attempt.
///
/// Created in `main.rs` and shared across the Actix application as `web::Data`.
#[derive(Clone)]
pub struct JournalState {
    /// Attempt id -> latest status. Written only by `start_journal_writer`.
    pub attempts: Arc<RwLock<HashMap<String, SubmissionStatus>>>,

    /// Producers (the pipeline) push updates here.
    pub tx: mpsc::Sender<JournalUpdate>,

    store: Option<SharedStore>,
}

#[derive(Debug)]
pub struct JournalUpdate {
    pub(crate) status: SubmissionStatus,
}

impl JournalState {
    /// In-memory journal; nothing survives a restart.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JournalUpdate>) {
        Self::with_store(capacity, None)
    }

    pub fn with_store(
        capacity: usize,
        store: Option<JournalStore>,
    ) -> (Self, mpsc::Receiver<JournalUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = JournalState {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            tx,
            store: store.map(|store| Arc::new(Mutex::new(store))),
        };
        (state, rx)
    }

    /// Handle for `start_journal_writer`.
    pub fn store(&self) -> Option<SharedStore> {
        self.store.clone()
    }

    /// Latest status of an attempt, from memory or else from the store.
    pub async fn get(&self, attempt_id: &str) -> Option<SubmissionStatus> {
        if let Some(status) = self.attempts.read().await.get(attempt_id) {
            return Some(status.clone());
        }
        let store = self.store.clone()?;
        let id = attempt_id.to_string();
        let found = tokio::task::spawn_blocking(move || lock(&store).find(&id)).await;
        match found {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                error!("Failed to read journal entry {}: {}", attempt_id, e);
                None
            }
            Err(e) => {
                error!("Journal lookup for {} did not finish: {}", attempt_id, e);
                None
            }
        }
    }

    /// Starts tracking a new attempt in the `Received` stage.
    pub async fn begin(&self, attempt_id: &str, full_name: &str, class_applied: &str) -> AttemptTracker {
        let tracker = AttemptTracker {
            tx: self.tx.clone(),
            status: SubmissionStatus {
                attempt_id: attempt_id.to_string(),
                full_name: full_name.to_string(),
                class_applied: class_applied.to_string(),
                stage: SubmissionStage::Received,
                error: None,
            },
        };
        tracker.publish().await;
        tracker
    }
}

/// Per-attempt handle used by the pipeline to report progress.
pub struct AttemptTracker {
    tx: mpsc::Sender<JournalUpdate>,
    status: SubmissionStatus,
}

impl AttemptTracker {
    pub fn attempt_id(&self) -> &str {
        &self.status.attempt_id
    }

    pub fn stage(&self) -> SubmissionStage {
        self.status.stage
    }

    pub async fn reached(&mut self, stage: SubmissionStage) {
        self.status.stage = stage;
        self.publish().await;
    }

    /// Marks the attempt failed; `stage` stays at the last completed stage.
    pub async fn failed(&mut self, reason: &str) {
        self.status.error = Some(reason.to_string());
        self.publish().await;
    }

    async fn publish(&self) {
        let update = JournalUpdate {
            status: self.status.clone(),
        };
        if self.tx.send(update).await.is_err() {
            warn!(
                "Journal writer is gone; stage {} of {} not recorded",
                self.status.stage.as_str(),
                self.status.attempt_id
            );
        }
    }
}

/// Long-running consumer of `JournalUpdate`s; spawn once from `main.rs`.
///
/// Returns when every sender is dropped.
pub async fn start_journal_writer(
    attempts: Arc<RwLock<HashMap<String, SubmissionStatus>>>,
    rx: mpsc::Receiver<JournalUpdate>,
    store: Option<SharedStore>,
) {
    run_journal_writer(attempts, rx, store, RECENT_COMPLETED).await
}

async fn run_journal_writer(
    attempts: Arc<RwLock<HashMap<String, SubmissionStatus>>>,
    mut rx: mpsc::Receiver<JournalUpdate>,
    store: Option<SharedStore>,
    keep_completed: usize,
) {
    let previous = store.as_ref().map(|store| lock(store).unfinished());
    match previous {
        Some(Ok(previous)) => {
            let mut attempts = attempts.write().await;
            for status in previous {
                attempts.insert(status.attempt_id.clone(), status);
            }
        }
        Some(Err(e)) => error!("Failed to load submission journal: {}", e),
        None => {}
    }

    // Completion order of the attempts still held in memory.
    let mut completed: VecDeque<String> = VecDeque::new();
    while let Some(update) = rx.recv().await {
        let persisted = match &store {
            Some(store) => match lock(store).upsert(&update.status) {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        "Failed to persist journal entry {}: {}",
                        update.status.attempt_id, e
                    );
                    false
                }
            },
            None => false,
        };

        // A completed attempt the store failed to record stays in memory.
        let evictable = update.status.stage == SubmissionStage::Completed
            && (persisted || store.is_none());
        let attempt_id = update.status.attempt_id.clone();

        let mut attempts = attempts.write().await;
        attempts.insert(attempt_id.clone(), update.status);
        if evictable {
            completed.push_back(attempt_id);
        }
        while completed.len() > keep_completed {
            if let Some(oldest) = completed.pop_front() {
                attempts.remove(&oldest);
            }
        }
    }
}
