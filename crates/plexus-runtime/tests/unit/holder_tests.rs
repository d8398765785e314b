//! Unit tests for the memoizing service holder

use crate::test_utils::{Built, counting_factory, plain_factory};
use plexus_domain::ports::{EnumerableServiceHolder, ServiceFactoryBuilder, ServiceHolder};
use plexus_domain::{CapabilityRef, Error, ServiceRef, ServiceScope};
use plexus_runtime::DefaultServiceHolder;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const CONFIG: ServiceRef<Built> = ServiceRef::new("core.config");
const LOGGER: ServiceRef<Built> = ServiceRef::new("core.logger");
const DB: ServiceRef<Built> = ServiceRef::new("core.db");

fn built(instance: &plexus_domain::Instance) -> Arc<Built> {
    Arc::clone(instance)
        .downcast::<Built>()
        .expect("instance should be a Built")
}

#[tokio::test]
async fn test_singleton_shared_across_modules() {
    let counter = Arc::new(AtomicUsize::new(0));
    let holder = DefaultServiceHolder::new(vec![counting_factory(
        &CONFIG,
        ServiceScope::Singleton,
        &counter,
    )])
    .expect("holder should build");

    let first = holder.resolve(&CONFIG.erase(), "catalog").await.expect("resolve");
    let second = holder.resolve(&CONFIG.erase(), "search").await.expect("resolve");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(built(&first).module, None);
}

#[tokio::test]
async fn test_per_module_instances_are_distinct() {
    let counter = Arc::new(AtomicUsize::new(0));
    let holder = DefaultServiceHolder::new(vec![counting_factory(
        &LOGGER,
        ServiceScope::PerModule,
        &counter,
    )])
    .expect("holder should build");

    let catalog = holder.resolve(&LOGGER.erase(), "catalog").await.expect("resolve");
    let catalog_again = holder.resolve(&LOGGER.erase(), "catalog").await.expect("resolve");
    let search = holder.resolve(&LOGGER.erase(), "search").await.expect("resolve");

    assert!(Arc::ptr_eq(&catalog, &catalog_again));
    assert!(!Arc::ptr_eq(&catalog, &search));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(built(&catalog).module.as_deref(), Some("catalog"));
    assert_eq!(built(&search).module.as_deref(), Some("search"));
    assert_eq!(holder.constructed_count(), 2);
}

struct ScopedLogger {
    module: String,
    config: Arc<Built>,
}

const SCOPED_LOGGER: ServiceRef<ScopedLogger> = ServiceRef::new("core.scoped-logger");

#[tokio::test]
async fn test_per_module_instances_share_singleton_dependencies() {
    let logger = ServiceFactoryBuilder::new(&SCOPED_LOGGER)
        .scope(ServiceScope::PerModule)
        .dep("config", &CONFIG)
        .build(|ctx| async move {
            Ok(ScopedLogger {
                module: ctx.module_id.unwrap_or_default(),
                config: ctx.deps.get::<Built>("config")?,
            })
        });
    let holder = DefaultServiceHolder::new(vec![logger, plain_factory(&CONFIG)])
        .expect("holder should build");

    let a = holder
        .resolve(&SCOPED_LOGGER.erase(), "a")
        .await
        .expect("resolve")
        .downcast::<ScopedLogger>()
        .expect("scoped logger");
    let b = holder
        .resolve(&SCOPED_LOGGER.erase(), "b")
        .await
        .expect("resolve")
        .downcast::<ScopedLogger>()
        .expect("scoped logger");

    assert_eq!(a.module, "a");
    assert_eq!(b.module, "b");
    assert!(Arc::ptr_eq(&a.config, &b.config));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_construct_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&counter);
    let slow = ServiceFactoryBuilder::new(&DB).build(move |_ctx| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Built {
                service: "core.db".to_string(),
                module: None,
                sequence: 1,
            })
        }
    });
    let holder = DefaultServiceHolder::new(vec![slow]).expect("holder should build");

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let holder = holder.clone();
            tokio::spawn(async move { holder.resolve(&DB.erase(), &format!("module-{i}")).await })
        })
        .collect();

    let mut instances = Vec::new();
    for handle in handles {
        instances.push(handle.await.expect("task").expect("resolve"));
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
}

#[tokio::test]
async fn test_unknown_service() {
    let holder = DefaultServiceHolder::new(vec![plain_factory(&CONFIG)]).expect("holder");

    let err = holder
        .resolve(&DB.erase(), "catalog")
        .await
        .expect_err("unknown service should fail");
    match err {
        Error::UnknownCapability {
            capability,
            requested_by,
        } => {
            assert_eq!(capability, "core.db");
            assert_eq!(requested_by, "catalog");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(holder.get(&DB.erase(), "catalog").is_none());
    assert!(holder.get(&CONFIG.erase(), "catalog").is_some());
}

#[tokio::test]
async fn test_get_is_deferred() {
    let counter = Arc::new(AtomicUsize::new(0));
    let holder = DefaultServiceHolder::new(vec![counting_factory(
        &CONFIG,
        ServiceScope::Singleton,
        &counter,
    )])
    .expect("holder");

    let deferred = holder.get(&CONFIG.erase(), "catalog").expect("known service");
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    deferred.await.expect("construction should succeed");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_factory_dependency_names_parent() {
    let db = ServiceFactoryBuilder::new(&DB)
        .dep("config", &CONFIG)
        .build(|_ctx| async { Ok(Built { service: "core.db".into(), module: None, sequence: 1 }) });
    let holder = DefaultServiceHolder::new(vec![db]).expect("holder");

    let err = holder.resolve(&DB.erase(), "catalog").await.expect_err("should fail");
    assert!(
        matches!(err, Error::UnknownCapability { ref capability, ref requested_by }
            if capability == "core.config" && requested_by == "core.db"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_factory_cycle() {
    let a = ServiceRef::<Built>::new("svc.a");
    let b = ServiceRef::<Built>::new("svc.b");
    let fa = ServiceFactoryBuilder::new(&a)
        .dep("b", &b)
        .build(|_ctx| async { Ok(Built { service: "svc.a".into(), module: None, sequence: 1 }) });
    let fb = ServiceFactoryBuilder::new(&b)
        .dep("a", &a)
        .build(|_ctx| async { Ok(Built { service: "svc.b".into(), module: None, sequence: 1 }) });
    let holder = DefaultServiceHolder::new(vec![fa, fb]).expect("holder");

    let err = holder.resolve(&a.erase(), "m").await.expect_err("cycle should fail");
    match err {
        Error::CyclicDependency { cycle } => assert_eq!(cycle, vec!["svc.a", "svc.b", "svc.a"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_services_listed_once_each() {
    let err = DefaultServiceHolder::new(vec![
        plain_factory(&CONFIG),
        plain_factory(&DB),
        plain_factory(&CONFIG),
        plain_factory(&DB),
        plain_factory(&CONFIG),
    ])
    .expect_err("duplicates should fail");

    match err {
        Error::DuplicateCapability { ids } => assert_eq!(ids, vec!["core.config", "core.db"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_singleton_may_not_depend_on_per_module() {
    let counter = Arc::new(AtomicUsize::new(0));
    let db = ServiceFactoryBuilder::new(&DB)
        .dep("logger", &LOGGER)
        .build(|_ctx| async { Ok(Built { service: "core.db".into(), module: None, sequence: 1 }) });

    let err = DefaultServiceHolder::new(vec![
        db,
        counting_factory(&LOGGER, ServiceScope::PerModule, &counter),
    ])
    .expect_err("scope violation should fail");

    assert!(
        matches!(err, Error::ScopeViolation { ref service, ref dependency }
            if service == "core.db" && dependency == "core.logger"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_failed_construction_is_cached() {
    let counter = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&counter);
    let failing = ServiceFactoryBuilder::new(&DB).build(move |_ctx| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<Built, _>(Error::generic("connection refused")) }
    });
    let holder = DefaultServiceHolder::new(vec![failing]).expect("holder");

    for module in ["catalog", "search"] {
        let err = holder.resolve(&DB.erase(), module).await.expect_err("should fail");
        assert!(
            matches!(err, Error::ServiceCreate { ref service, .. } if service == "core.db"),
            "unexpected error: {err}"
        );
        assert!(err.to_string().contains("connection refused"));
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(holder.constructed_count(), 0);
}

#[test]
fn test_service_refs_in_registration_order() {
    let holder = DefaultServiceHolder::new(vec![
        plain_factory(&DB),
        plain_factory(&CONFIG),
        plain_factory(&LOGGER),
    ])
    .expect("holder");

    let ids: Vec<String> = holder
        .service_refs()
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    assert_eq!(ids, vec!["core.db", "core.config", "core.logger"]);
    assert!(holder.contains(&CapabilityRef::service("core.config")));
    assert!(!holder.contains(&CapabilityRef::extension_point("core.config")));
}

struct Clock {
    service: CapabilityRef,
    deps: std::collections::BTreeMap<String, CapabilityRef>,
}

struct FixedTime(u64);

#[async_trait::async_trait]
impl plexus_domain::ports::ServiceFactory for Clock {
    fn service(&self) -> &CapabilityRef {
        &self.service
    }

    fn deps(&self) -> &std::collections::BTreeMap<String, CapabilityRef> {
        &self.deps
    }

    async fn create(
        &self,
        _ctx: plexus_domain::ports::FactoryContext,
    ) -> plexus_domain::Result<plexus_domain::Instance> {
        Ok(plexus_domain::instance(FixedTime(42)))
    }
}

#[tokio::test]
async fn test_hand_written_factory() {
    let clock: Arc<dyn plexus_domain::ports::ServiceFactory> = Arc::new(Clock {
        service: CapabilityRef::service("core.clock"),
        deps: std::collections::BTreeMap::new(),
    });
    let holder = DefaultServiceHolder::new(vec![clock]).expect("holder");

    let time = holder
        .resolve(&CapabilityRef::service("core.clock"), "m")
        .await
        .expect("resolve")
        .downcast::<FixedTime>()
        .expect("fixed time");
    assert_eq!(time.0, 42);
}
