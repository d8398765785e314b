//! Module registrations
//!
//! A module registration is pure data: what the module consumes, what it
//! provides, which dependencies it wants by name, and the async hooks the
//! backend calls during `start` and `stop`. Nothing is resolved or executed
//! when a registration is built.
//!
//! ```
//! use plexus_domain::capability::ServiceRef;
//! use plexus_domain::registration::ModuleRegistration;
//!
//! struct Db;
//! const DB: ServiceRef<Db> = ServiceRef::new("core.db");
//!
//! let module = ModuleRegistration::builder("catalog")
//!     .dep("db", &DB)
//!     .init(|deps| async move {
//!         let _db = deps.get::<Db>("db")?;
//!         Ok(())
//!     });
//! assert_eq!(module.id(), "catalog");
//! assert!(module.consumes().contains(&DB.erase()));
//! ```

use crate::capability::{CapabilityRef, ExtensionPointRef};
use crate::error::Result;
use crate::instance::{Instance, ResolvedDeps};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Module initializer, called once with the resolved dependencies
pub type InitFn = Box<dyn FnOnce(ResolvedDeps) -> BoxFuture<'static, Result<()>> + Send>;

/// Module shutdown hook, called once while the backend stops
pub type ShutdownFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// A registered feature module
pub struct ModuleRegistration {
    id: String,
    consumes: BTreeSet<CapabilityRef>,
    provides: BTreeSet<CapabilityRef>,
    deps: BTreeMap<String, CapabilityRef>,
    extension_points: BTreeMap<CapabilityRef, Instance>,
    init: Option<InitFn>,
    shutdown: Option<ShutdownFn>,
}

impl ModuleRegistration {
    /// Start building a registration for `id`
    pub fn builder(id: impl Into<String>) -> ModuleRegistrationBuilder {
        ModuleRegistrationBuilder {
            id: id.into(),
            consumes: BTreeSet::new(),
            provides: BTreeSet::new(),
            deps: BTreeMap::new(),
            extension_points: BTreeMap::new(),
            shutdown: None,
        }
    }

    /// Module id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Capabilities this module consumes, including every named dependency
    pub fn consumes(&self) -> &BTreeSet<CapabilityRef> {
        &self.consumes
    }

    /// Capabilities this module provides, including owned extension points
    pub fn provides(&self) -> &BTreeSet<CapabilityRef> {
        &self.provides
    }

    /// Named dependencies handed to the initializer
    pub fn deps(&self) -> &BTreeMap<String, CapabilityRef> {
        &self.deps
    }

    /// Extension point implementations owned by this module
    pub fn extension_points(&self) -> &BTreeMap<CapabilityRef, Instance> {
        &self.extension_points
    }

    /// Whether this module registered a shutdown hook
    pub fn has_shutdown_hook(&self) -> bool {
        self.shutdown.is_some()
    }

    /// Take the initializer; `None` once it was taken
    pub fn take_init(&mut self) -> Option<InitFn> {
        self.init.take()
    }

    /// Take the shutdown hook; `None` if absent or already taken
    pub fn take_shutdown(&mut self) -> Option<ShutdownFn> {
        self.shutdown.take()
    }
}

impl fmt::Debug for ModuleRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistration")
            .field("id", &self.id)
            .field("consumes", &self.consumes)
            .field("provides", &self.provides)
            .field("deps", &self.deps)
            .field(
                "extension_points",
                &self.extension_points.keys().collect::<Vec<_>>(),
            )
            .field("has_init", &self.init.is_some())
            .field("has_shutdown", &self.shutdown.is_some())
            .finish()
    }
}

/// Builder for [`ModuleRegistration`]
pub struct ModuleRegistrationBuilder {
    id: String,
    consumes: BTreeSet<CapabilityRef>,
    provides: BTreeSet<CapabilityRef>,
    deps: BTreeMap<String, CapabilityRef>,
    extension_points: BTreeMap<CapabilityRef, Instance>,
    shutdown: Option<ShutdownFn>,
}

impl ModuleRegistrationBuilder {
    /// Declare a consumed capability without asking for its instance
    pub fn consumes(mut self, capability: impl Into<CapabilityRef>) -> Self {
        self.consumes.insert(capability.into());
        self
    }

    /// Declare a provided capability
    pub fn provides(mut self, capability: impl Into<CapabilityRef>) -> Self {
        self.provides.insert(capability.into());
        self
    }

    /// Declare a named dependency; it is also recorded as consumed
    pub fn dep(mut self, name: impl Into<String>, capability: impl Into<CapabilityRef>) -> Self {
        let capability = capability.into();
        self.consumes.insert(capability.clone());
        self.deps.insert(name.into(), capability);
        self
    }

    /// Own an extension point and supply its implementation
    pub fn extension_point<T: Any + Send + Sync>(
        mut self,
        point: &ExtensionPointRef<T>,
        implementation: Arc<T>,
    ) -> Self {
        let point = point.erase();
        self.provides.insert(point.clone());
        self.extension_points.insert(point, implementation as Instance);
        self
    }

    /// Register a shutdown hook
    pub fn on_shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.shutdown = Some(Box::new(move || hook().boxed()));
        self
    }

    /// Finish the registration with its initializer
    pub fn init<F, Fut>(self, init: F) -> ModuleRegistration
    where
        F: FnOnce(ResolvedDeps) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.finish(Box::new(move |deps| init(deps).boxed()))
    }

    /// Finish the registration with an initializer that does nothing
    pub fn build(self) -> ModuleRegistration {
        self.finish(Box::new(|_| async { Ok(()) }.boxed()))
    }

    fn finish(self, init: InitFn) -> ModuleRegistration {
        ModuleRegistration {
            id: self.id,
            consumes: self.consumes,
            provides: self.provides,
            deps: self.deps,
            extension_points: self.extension_points,
            init: Some(init),
            shutdown: self.shutdown,
        }
    }
}
