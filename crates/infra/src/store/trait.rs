use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use bankledger_banking::{Account, ActivityRecord, Customer};

/// Everything the ledger persists, as one unit.
///
/// `LedgerSnapshot` is what a store loads and what the ledger commits after
/// every successful mutation. The three collections are always written
/// together; there is no way to commit one without the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub customers: Vec<Customer>,
    pub accounts: Vec<Account>,
    pub activity: Vec<ActivityRecord>,
}

impl LedgerSnapshot {
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty() && self.accounts.is_empty() && self.activity.is_empty()
    }
}

/// Durable storage failure.
///
/// These are **durability errors**: when one surfaces, the caller cannot
/// assume its change was recorded. A `DomainError` means "rejected, nothing
/// changed"; a `StoreError` means "possibly lost".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize {collection}: {source}")]
    Serialization {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt {collection} data: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },

    #[error("state lock poisoned: {0}")]
    Poisoned(String),

    #[error("commit rejected by store: {0}")]
    CommitRejected(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Durable home of the ledger's customers, accounts and activity history.
///
/// ## Load Semantics
///
/// `load()` returns all three collections. A collection that was never
/// written (first run) loads as empty, not as an error. Referential repair is
/// not the store's job; the ledger applies it after loading.
///
/// ## Commit Semantics
///
/// `commit()` replaces the durable state with the given snapshot. After it
/// returns `Ok`, a subsequent `load()` (in this or a later process) must yield
/// an equal snapshot. Any failure must be reported, never swallowed.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<LedgerSnapshot, StoreError>;

    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        (**self).load()
    }

    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        (**self).commit(snapshot)
    }
}
