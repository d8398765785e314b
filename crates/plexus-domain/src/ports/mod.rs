//! Domain Port Interfaces
//!
//! Boundary contracts between the engine and the collaborators that plug into
//! it:
//!
//! - **factory** - how a capability instance gets built
//! - **holder** - how built instances are looked up

/// Service factory port and closure-backed implementation
pub mod factory;
/// Service holder port
pub mod holder;

pub use factory::{
    FactoryContext, FactorySource, FnServiceFactory, ServiceFactory, ServiceFactoryBuilder,
};
pub use holder::{DeferredInstance, EnumerableServiceHolder, ServiceHolder};
