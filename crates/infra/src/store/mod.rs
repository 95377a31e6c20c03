//! Durable persistence boundary for ledger state.
//!
//! The ledger talks to storage only through [`LedgerStore`]; this module holds
//! the trait, its implementations, and the referential repair applied to
//! freshly loaded state.

pub mod in_memory;
pub mod json_file;
mod records;
pub mod repair;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use json_file::JsonFileStore;
pub use repair::{Repair, RepairReason, prune_dangling_references};
pub use r#trait::{LedgerSnapshot, LedgerStore, StoreError};
