//! # Plexus Infrastructure
//!
//! Cross-cutting concerns around the runtime.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment-based layered configuration |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error_ext`] | Context helpers for foreign errors |
//! | [`bootstrap`] | Backend construction from configuration |
//! | [`constants`] | File names, env prefixes and defaults |

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;

pub use bootstrap::BackendBootstrap;
pub use config::{AppConfig, ConfigLoader, LoggingConfig};
pub use error_ext::ErrorContext;
pub use logging::{init_logging, parse_log_level};
