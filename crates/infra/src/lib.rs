//! Infrastructure layer: durable storage, configuration, and the ledger
//! coordinator that ties domain rules to storage.

pub mod config;
pub mod ledger;
pub mod store;


pub use config::LedgerConfig;
pub use ledger::{Ledger, LedgerError, LedgerResult};
pub use store::{InMemoryLedgerStore, JsonFileStore, LedgerSnapshot, LedgerStore, StoreError};
