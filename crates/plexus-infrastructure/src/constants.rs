//! Infrastructure layer constants
//!
//! Runtime defaults live in `plexus_runtime::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "plexus.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "plexus";

/// Environment variable prefix for configuration
///
/// Nested keys are separated by a double underscore, e.g.
/// `PLEXUS__BACKEND__INIT_STRATEGY=concurrent`.
pub const CONFIG_ENV_PREFIX: &str = "PLEXUS";

/// Separator between the prefix and nested configuration keys
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV_VAR: &str = "PLEXUS_LOG";

/// File name prefix used when the log file path has no stem
pub const DEFAULT_LOG_FILE_PREFIX: &str = "plexus";
