use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::r#trait::{LedgerSnapshot, LedgerStore, StoreError};

/// In-memory ledger store.
///
/// Intended for tests/dev. Keeps the last committed snapshot, counts commits,
/// and can be told to reject the next commit to exercise durability-failure
/// paths.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    snapshot: RwLock<LedgerSnapshot>,
    commits: AtomicUsize,
    fail_next_commit: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously "persisted" state.
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Make the next `commit()` fail with `StoreError::CommitRejected`.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Copy of the last committed snapshot.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, StoreError> {
        self.load()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|_| StoreError::Poisoned("in-memory snapshot".to_string()))?;
        Ok(snapshot.clone())
    }

    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::CommitRejected(
                "injected in-memory commit failure".to_string(),
            ));
        }

        let mut current = self
            .snapshot
            .write()
            .map_err(|_| StoreError::Poisoned("in-memory snapshot".to_string()))?;
        *current = snapshot.clone();
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
