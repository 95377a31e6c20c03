//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize JSON logging for the process, filtered by `RUST_LOG`.
///
/// Safe to call multiple times (subsequent calls are no-ops). Returns whether
/// this call installed the subscriber.
pub fn init() -> bool {
    init_with_default(DEFAULT_FILTER)
}

/// Like [`init`], with a caller-chosen fallback filter such as
/// `"bankledger_infra=debug,info"`.
pub fn init_with_default(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    // JSON logs + timestamps; ledger fields (account_id, amount, ...) become JSON keys.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init()
        .is_ok()
}
