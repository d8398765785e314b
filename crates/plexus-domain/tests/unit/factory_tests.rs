//! Unit tests for service factory ports

use plexus_domain::ports::{FactoryContext, FactorySource, ServiceFactory, ServiceFactoryBuilder};
use plexus_domain::{CapabilityRef, ResolvedDeps, ServiceRef, ServiceScope};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Config;
#[derive(Debug)]
struct Greeter(String);

const CONFIG: ServiceRef<Config> = ServiceRef::new("core.config");
const GREETER: ServiceRef<Greeter> = ServiceRef::new("demo.greeter");

#[tokio::test]
async fn test_builder_factory_creates_typed_instance() {
    let factory = ServiceFactoryBuilder::new(&GREETER)
        .scope(ServiceScope::PerModule)
        .dep("config", &CONFIG)
        .build(|ctx: FactoryContext| async move {
            Ok(Greeter(ctx.module_id.unwrap_or_default()))
        });

    assert_eq!(factory.service(), &GREETER.erase());
    assert_eq!(factory.scope(), ServiceScope::PerModule);
    assert_eq!(factory.dependency_refs(), vec![CONFIG.erase()]);

    let built = factory
        .create(FactoryContext {
            module_id: Some("catalog".to_string()),
            deps: ResolvedDeps::new(),
        })
        .await
        .expect("factory should succeed");
    let greeter = built.downcast::<Greeter>().expect("instance should be a Greeter");
    assert_eq!(greeter.0, "catalog");
}

#[test]
fn test_dependency_refs_are_deduplicated() {
    let factory = ServiceFactoryBuilder::new(&GREETER)
        .dep("a", &CONFIG)
        .dep("b", CapabilityRef::service("core.config"))
        .build(|_| async { Ok(Greeter(String::new())) });
    assert_eq!(factory.deps().len(), 2);
    assert_eq!(factory.dependency_refs().len(), 1);
}

#[test]
fn test_lazy_source_runs_producer_once_on_resolution() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let source = FactorySource::lazy(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        ServiceFactoryBuilder::new(&GREETER).build(|_| async { Ok(Greeter(String::new())) })
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(format!("{source:?}"), "Lazy(..)");

    let factory = source.into_factory();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(factory.service().id(), "demo.greeter");
}

#[test]
fn test_prebuilt_source_from_arc() {
    let factory = ServiceFactoryBuilder::new(&GREETER).build(|_| async { Ok(Greeter(String::new())) });
    let source = FactorySource::from(Arc::clone(&factory));
    assert!(Arc::ptr_eq(&source.into_factory(), &factory));
}
