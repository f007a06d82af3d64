//! Chain-wide configuration constants.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Epoch of the block timestamp type: 2000-01-01T00:00:00.000 UTC,
/// in milliseconds since the Unix epoch.
pub const BLOCK_TIMESTAMP_EPOCH_MS: i64 = 946_684_800_000;

/// Duration of a block slot, in milliseconds.
pub const BLOCK_INTERVAL_MS: i64 = 500;
