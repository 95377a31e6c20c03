//! Log output for processes that embed the ledger.
//!
//! The ledger crates emit `tracing` events (customer and account changes,
//! repairs on load, failed commits) but never install a subscriber. A host
//! calls [`init`] once at startup to get them as JSON lines on stdout.

pub mod tracing;

/// Install the JSON log subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Calling it again, or after another subscriber was installed, does nothing.
pub fn init() {
    tracing::init();
}
