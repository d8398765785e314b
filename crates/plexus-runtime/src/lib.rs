//! # Plexus Runtime
//!
//! The dependency resolution and lifecycle engine.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`holder`] | Memoizing, concurrency-safe service construction |
//! | [`graph`] | Provider validation and topological module ordering |
//! | [`backend`] | The `Backend` handle and its lifecycle state machine |
//! | [`options`] | Initializer scheduling and timeouts |
//! | [`constants`] | Runtime defaults |
//!
//! ## Flow
//!
//! ```text
//! create_specialized_backend(factories)    duplicate service ids rejected here
//!            │
//!        add(module)*                      pure registration
//!            │
//!         start()  ── graph::resolve ──▶ InitPlan ──▶ init each module
//!            │                                        (deps via DefaultServiceHolder)
//!          stop()  ── shutdown hooks in reverse init order
//! ```

pub mod backend;
pub mod constants;
pub mod graph;
pub mod holder;
pub mod options;

pub use backend::{Backend, CreateBackendOptions, create_specialized_backend};
pub use graph::InitPlan;
pub use holder::DefaultServiceHolder;
pub use options::{BackendOptions, InitStrategy};
