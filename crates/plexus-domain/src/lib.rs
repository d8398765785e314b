//! # Plexus Domain
//!
//! Core types shared by every layer of the Plexus runtime.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | `CapabilityRef` and its typed front-ends |
//! | [`instance`] | Type-erased instances and resolved dependency maps |
//! | [`registration`] | Feature module registrations |
//! | [`lifecycle`] | Backend lifecycle state |
//! | [`ports`] | `ServiceFactory` and `ServiceHolder` contracts |
//! | [`error`] | The error type and `Result` alias |
//!
//! This crate holds no runtime behavior: graph resolution, memoized
//! construction and lifecycle orchestration live in `plexus-runtime`.

pub mod capability;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod ports;
pub mod registration;

pub use capability::{CapabilityKind, CapabilityRef, ExtensionPointRef, ServiceRef, ServiceScope};
pub use error::{Error, ProviderConflict, Result, ShutdownFailure};
pub use instance::{Instance, ResolvedDeps, instance};
pub use lifecycle::LifecycleState;
pub use registration::{InitFn, ModuleRegistration, ModuleRegistrationBuilder, ShutdownFn};
