//! Banking domain module (customers, accounts, activity history).
//!
//! Pure domain logic only: no IO, no persistence, no locking. The ledger
//! coordinator in `bankledger-infra` owns instances of these types and is the
//! only code that mutates them.

pub mod account;
pub mod activity;
pub mod customer;

pub use account::{
    Account, AccountKind, AccountPolicy, AccountTerms, DEFAULT_INTEREST_RATE,
    DEFAULT_OVERDRAFT_LIMIT,
};
pub use activity::{Activity, ActivityLog, ActivityRecord};
pub use customer::Customer;
