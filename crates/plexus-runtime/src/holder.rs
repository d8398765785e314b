//! Memoizing service holder
//!
//! Owns every registered [`ServiceFactory`] and the construction cache. Each
//! `(service, scope-key)` pair is built at most once; concurrent requests for
//! the same key wait on the same construction.
//!
//! ## Resolution
//!
//! ```text
//! resolve(S, module)
//!   ├─ factory for S?            no → UnknownCapability
//!   ├─ S already on the path?   yes → CyclicDependency
//!   ├─ resolve every dep of S (depth-first, path + S)
//!   └─ cache[(S, scope-key)].get_or_init(factory.create)
//! ```
//!
//! Singleton services use a scope key independent of the requester;
//! per-module services are keyed by `(service, module)`. A failed
//! construction is cached as well, so every requester sees the same failure
//! and the factory is never retried.

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use plexus_domain::error::{Error, Result};
use plexus_domain::instance::{Instance, ResolvedDeps};
use plexus_domain::ports::{
    DeferredInstance, EnumerableServiceHolder, FactoryContext, ServiceFactory, ServiceHolder,
};
use plexus_domain::{CapabilityRef, ServiceScope};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Cache key for one constructed instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ScopeKey {
    Singleton(String),
    PerModule { service: String, module: String },
}

impl ScopeKey {
    fn new(scope: ServiceScope, service: &CapabilityRef, module_id: &str) -> Self {
        match scope {
            ServiceScope::Singleton => Self::Singleton(service.id().to_string()),
            ServiceScope::PerModule => Self::PerModule {
                service: service.id().to_string(),
                module: module_id.to_string(),
            },
        }
    }
}

type CachedInstance = std::result::Result<Instance, Arc<Error>>;

struct HolderInner {
    factories: Vec<Arc<dyn ServiceFactory>>,
    index: HashMap<CapabilityRef, usize>,
    cache: DashMap<ScopeKey, Arc<OnceCell<CachedInstance>>>,
}

impl HolderInner {
    fn factory(&self, service: &CapabilityRef) -> Option<&Arc<dyn ServiceFactory>> {
        self.index.get(service).map(|&i| &self.factories[i])
    }
}

/// Default [`ServiceHolder`] implementation
///
/// Cheap to clone; clones share factories and cache.
#[derive(Clone)]
pub struct DefaultServiceHolder {
    inner: Arc<HolderInner>,
}

impl DefaultServiceHolder {
    /// Create a holder from a list of factories
    ///
    /// Fails with [`Error::DuplicateCapability`] listing every service id
    /// provided more than once, or [`Error::ScopeViolation`] when a singleton
    /// factory depends on a per-module service.
    pub fn new(factories: Vec<Arc<dyn ServiceFactory>>) -> Result<Self> {
        let mut index = HashMap::with_capacity(factories.len());
        let mut duplicates: Vec<String> = Vec::new();

        for (position, factory) in factories.iter().enumerate() {
            let service = factory.service().clone();
            if index.contains_key(&service) {
                if !duplicates.iter().any(|id| id == service.id()) {
                    duplicates.push(service.id().to_string());
                }
            } else {
                index.insert(service, position);
            }
        }

        if !duplicates.is_empty() {
            return Err(Error::DuplicateCapability { ids: duplicates });
        }

        let inner = HolderInner {
            factories,
            index,
            cache: DashMap::new(),
        };
        validate_scopes(&inner)?;

        debug!(services = inner.factories.len(), "Service holder created");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Resolve `service` as seen by `module_id`, constructing it if needed
    pub async fn resolve(&self, service: &CapabilityRef, module_id: &str) -> Result<Instance> {
        resolve_inner(
            Arc::clone(&self.inner),
            service.clone(),
            module_id.to_string(),
            Vec::new(),
        )
        .await
    }

    /// Factory registered for `service`
    pub fn factory(&self, service: &CapabilityRef) -> Option<Arc<dyn ServiceFactory>> {
        self.inner.factory(service).cloned()
    }

    /// Whether a factory is registered for `service`
    pub fn contains(&self, service: &CapabilityRef) -> bool {
        self.inner.index.contains_key(service)
    }

    /// Number of successfully constructed instances
    pub fn constructed_count(&self) -> usize {
        self.inner
            .cache
            .iter()
            .filter(|entry| matches!(entry.value().get(), Some(Ok(_))))
            .count()
    }
}

impl ServiceHolder for DefaultServiceHolder {
    fn get(&self, service: &CapabilityRef, module_id: &str) -> Option<DeferredInstance> {
        if !self.contains(service) {
            return None;
        }
        Some(resolve_inner(
            Arc::clone(&self.inner),
            service.clone(),
            module_id.to_string(),
            Vec::new(),
        ))
    }
}

impl EnumerableServiceHolder for DefaultServiceHolder {
    fn service_refs(&self) -> Vec<CapabilityRef> {
        self.inner
            .factories
            .iter()
            .map(|factory| factory.service().clone())
            .collect()
    }
}

impl fmt::Debug for DefaultServiceHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultServiceHolder")
            .field("services", &self.service_refs())
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}

fn validate_scopes(inner: &HolderInner) -> Result<()> {
    for factory in &inner.factories {
        if factory.scope() != ServiceScope::Singleton {
            continue;
        }
        for dependency in factory.dependency_refs() {
            if let Some(dep_factory) = inner.factory(&dependency) {
                if dep_factory.scope() == ServiceScope::PerModule {
                    return Err(Error::ScopeViolation {
                        service: factory.service().id().to_string(),
                        dependency: dependency.id().to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn resolve_inner(
    inner: Arc<HolderInner>,
    service: CapabilityRef,
    module_id: String,
    path: Vec<CapabilityRef>,
) -> BoxFuture<'static, Result<Instance>> {
    async move {
        let Some(factory) = inner.factory(&service).cloned() else {
            let requested_by = path
                .last()
                .map_or_else(|| module_id.clone(), |parent| parent.id().to_string());
            return Err(Error::unknown_capability(service.id(), requested_by));
        };

        if let Some(start) = path.iter().position(|seen| *seen == service) {
            let mut cycle: Vec<String> = path[start..].iter().map(|r| r.id().to_string()).collect();
            cycle.push(service.id().to_string());
            return Err(Error::CyclicDependency { cycle });
        }

        let key = ScopeKey::new(factory.scope(), &service, &module_id);
        let cell = Arc::clone(&inner.cache.entry(key).or_default());

        if let Some(cached) = cell.get() {
            return unwrap_cached(&service, cached);
        }

        let mut child_path = path;
        child_path.push(service.clone());

        let mut deps = ResolvedDeps::new();
        for (name, dependency) in factory.deps() {
            let resolved = resolve_inner(
                Arc::clone(&inner),
                dependency.clone(),
                module_id.clone(),
                child_path.clone(),
            )
            .await?;
            deps.insert(name.clone(), resolved);
        }

        let module = match factory.scope() {
            ServiceScope::Singleton => None,
            ServiceScope::PerModule => Some(module_id),
        };

        let cached = cell
            .get_or_init(|| async {
                debug!(service = %service, module = ?module, "Constructing service");
                let ctx = FactoryContext {
                    module_id: module.clone(),
                    deps,
                };
                factory.create(ctx).await.map_err(|error| {
                    warn!(service = %service, error = %error, "Service factory failed");
                    Arc::new(error)
                })
            })
            .await;

        unwrap_cached(&service, cached)
    }
    .boxed()
}

fn unwrap_cached(service: &CapabilityRef, cached: &CachedInstance) -> Result<Instance> {
    match cached {
        Ok(instance) => Ok(Arc::clone(instance)),
        Err(source) => Err(Error::ServiceCreate {
            service: service.id().to_string(),
            source: Arc::clone(source),
        }),
    }
}
