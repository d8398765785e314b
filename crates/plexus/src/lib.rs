//! # Plexus
//!
//! Service composition and lifecycle runtime for plugin-based backends.
//!
//! Feature modules declare the capabilities they consume and provide; service
//! factories build shared or per-module instances on demand. A [`Backend`]
//! validates the whole graph, initializes modules in dependency order and
//! unwinds them in reverse on shutdown.
//!
//! ## Example
//!
//! ```ignore
//! use plexus::{ModuleRegistration, ServiceRef, BackendBootstrap};
//! use plexus::domain::ports::ServiceFactoryBuilder;
//!
//! struct Database;
//! const DATABASE: ServiceRef<Database> = ServiceRef::new("core.database");
//!
//! let backend = BackendBootstrap::new()
//!     .with_service(ServiceFactoryBuilder::new(&DATABASE).build(|_ctx| async { Ok(Database) }))
//!     .build()?;
//!
//! backend.add(
//!     ModuleRegistration::builder("catalog")
//!         .dep("db", &DATABASE)
//!         .init(|deps| async move {
//!             let _db = deps.get::<Database>("db")?;
//!             Ok(())
//!         }),
//! )?;
//!
//! backend.start().await?;
//! backend.stop().await?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Capability refs, registrations, errors and port traits
//! - `runtime` - Service holder, graph resolver and backend lifecycle
//! - `infrastructure` - Configuration, logging and bootstrap

/// Domain layer - capability refs, registrations and errors
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use plexus_domain::*;
}

/// Runtime layer - service holder, graph resolver and backend
///
/// Re-exports from the runtime crate for convenience
pub mod runtime {
    pub use plexus_runtime::*;
}

/// Infrastructure layer - configuration, logging and bootstrap
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use plexus_infrastructure::*;
}

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the backend entry points at the crate root
pub use infrastructure::{AppConfig, BackendBootstrap, ConfigLoader};
pub use runtime::{
    Backend, BackendOptions, CreateBackendOptions, InitStrategy, create_specialized_backend,
};
