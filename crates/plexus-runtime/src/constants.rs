//! Runtime constants

// ============================================================================
// LIFECYCLE CONSTANTS
// ============================================================================

/// Default budget for a single module shutdown hook (30 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 30_000;

/// Operation name reported by `start` state errors
pub const START_OPERATION: &str = "start";

/// Operation name reported by `stop` state errors
pub const STOP_OPERATION: &str = "stop";
