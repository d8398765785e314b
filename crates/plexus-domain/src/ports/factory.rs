//! Service factory port
//!
//! A service factory knows how to build one service instance. It declares the
//! services it needs by logical name, and the runtime resolves those before
//! calling [`ServiceFactory::create`].

use crate::capability::{CapabilityRef, ServiceRef, ServiceScope};
use crate::error::Result;
use crate::instance::{Instance, ResolvedDeps};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Input handed to a factory when the runtime asks it for an instance
#[derive(Debug, Clone)]
pub struct FactoryContext {
    /// Requesting module, set only for [`ServiceScope::PerModule`] factories
    pub module_id: Option<String>,
    /// Resolved dependencies, keyed by the names the factory declared
    pub deps: ResolvedDeps,
}

/// Builds instances of one service
///
/// # Example
///
/// ```ignore
/// struct ClockFactory { service: CapabilityRef, deps: BTreeMap<String, CapabilityRef> }
///
/// #[async_trait]
/// impl ServiceFactory for ClockFactory {
///     fn service(&self) -> &CapabilityRef { &self.service }
///     fn deps(&self) -> &BTreeMap<String, CapabilityRef> { &self.deps }
///     async fn create(&self, _ctx: FactoryContext) -> Result<Instance> {
///         Ok(instance(SystemClock))
///     }
/// }
/// ```
#[async_trait]
pub trait ServiceFactory: Send + Sync {
    /// The service this factory provides
    fn service(&self) -> &CapabilityRef;

    /// Instance scope (default: singleton)
    fn scope(&self) -> ServiceScope {
        ServiceScope::Singleton
    }

    /// Named dependencies of this factory
    fn deps(&self) -> &BTreeMap<String, CapabilityRef>;

    /// Build an instance
    async fn create(&self, ctx: FactoryContext) -> Result<Instance>;

    /// Distinct dependency refs, ignoring the logical names
    fn dependency_refs(&self) -> Vec<CapabilityRef> {
        let mut refs: Vec<CapabilityRef> = self.deps().values().cloned().collect();
        refs.sort();
        refs.dedup();
        refs
    }
}

// ============================================================================
// Closure-backed factories
// ============================================================================

type CreateFn = Box<dyn Fn(FactoryContext) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;

/// Factory backed by an async closure, produced by [`ServiceFactoryBuilder`]
pub struct FnServiceFactory {
    service: CapabilityRef,
    scope: ServiceScope,
    deps: BTreeMap<String, CapabilityRef>,
    create: CreateFn,
}

#[async_trait]
impl ServiceFactory for FnServiceFactory {
    fn service(&self) -> &CapabilityRef {
        &self.service
    }

    fn scope(&self) -> ServiceScope {
        self.scope
    }

    fn deps(&self) -> &BTreeMap<String, CapabilityRef> {
        &self.deps
    }

    async fn create(&self, ctx: FactoryContext) -> Result<Instance> {
        (self.create)(ctx).await
    }
}

impl fmt::Debug for FnServiceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnServiceFactory")
            .field("service", &self.service)
            .field("scope", &self.scope)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Builder for closure-backed service factories
///
/// # Example
///
/// ```
/// use plexus_domain::capability::{ServiceRef, ServiceScope};
/// use plexus_domain::ports::{ServiceFactory, ServiceFactoryBuilder};
///
/// struct Greeter(String);
/// const GREETER: ServiceRef<Greeter> = ServiceRef::new("demo.greeter");
///
/// let factory = ServiceFactoryBuilder::new(&GREETER)
///     .scope(ServiceScope::PerModule)
///     .build(|ctx| async move {
///         Ok(Greeter(format!("hello from {}", ctx.module_id.unwrap_or_default())))
///     });
/// assert_eq!(factory.service().id(), "demo.greeter");
/// ```
pub struct ServiceFactoryBuilder<T> {
    service: CapabilityRef,
    scope: ServiceScope,
    deps: BTreeMap<String, CapabilityRef>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ServiceFactoryBuilder<T> {
    /// Start a factory for the given service
    pub fn new(service: &ServiceRef<T>) -> Self {
        Self {
            service: service.erase(),
            scope: ServiceScope::Singleton,
            deps: BTreeMap::new(),
            _marker: PhantomData,
        }
    }

    /// Set the instance scope
    pub fn scope(mut self, scope: ServiceScope) -> Self {
        self.scope = scope;
        self
    }

    /// Declare a named dependency
    pub fn dep(mut self, name: impl Into<String>, service: impl Into<CapabilityRef>) -> Self {
        self.deps.insert(name.into(), service.into());
        self
    }

    /// Finish the factory with its async constructor
    pub fn build<F, Fut>(self, create: F) -> Arc<dyn ServiceFactory>
    where
        F: Fn(FactoryContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let create: CreateFn = Box::new(move |ctx| {
            create(ctx)
                .map(|built| built.map(|value| Arc::new(value) as Instance))
                .boxed()
        });
        Arc::new(FnServiceFactory {
            service: self.service,
            scope: self.scope,
            deps: self.deps,
            create,
        })
    }
}

// ============================================================================
// Factory sources
// ============================================================================

/// A factory handed to the runtime, either ready or produced on demand
///
/// Lazy sources are invoked exactly once, when the backend is created.
pub enum FactorySource {
    /// Already-built factory
    Prebuilt(Arc<dyn ServiceFactory>),
    /// Zero-argument producer of a factory
    Lazy(Box<dyn FnOnce() -> Arc<dyn ServiceFactory> + Send>),
}

impl FactorySource {
    /// Wrap a factory value
    pub fn prebuilt(factory: impl ServiceFactory + 'static) -> Self {
        Self::Prebuilt(Arc::new(factory))
    }

    /// Wrap a factory producer
    pub fn lazy<F>(producer: F) -> Self
    where
        F: FnOnce() -> Arc<dyn ServiceFactory> + Send + 'static,
    {
        Self::Lazy(Box::new(producer))
    }

    /// Resolve into a factory, invoking the producer if needed
    pub fn into_factory(self) -> Arc<dyn ServiceFactory> {
        match self {
            Self::Prebuilt(factory) => factory,
            Self::Lazy(producer) => producer(),
        }
    }
}

impl From<Arc<dyn ServiceFactory>> for FactorySource {
    fn from(factory: Arc<dyn ServiceFactory>) -> Self {
        Self::Prebuilt(factory)
    }
}

impl fmt::Debug for FactorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prebuilt(factory) => f.debug_tuple("Prebuilt").field(factory.service()).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}
