//! Configuration management
//!
//! Layered with Figment: defaults, then `plexus.toml`, then `PLEXUS__*`
//! environment variables.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, LoggingConfig};
