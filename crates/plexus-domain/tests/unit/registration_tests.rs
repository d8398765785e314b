//! Unit tests for module registrations

use plexus_domain::{CapabilityRef, ExtensionPointRef, ModuleRegistration, ResolvedDeps, ServiceRef};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

struct Db;
struct Routes;

const DB: ServiceRef<Db> = ServiceRef::new("core.db");
const ROUTES: ExtensionPointRef<Routes> = ExtensionPointRef::new("catalog.routes");

#[test]
fn test_deps_are_recorded_as_consumed() {
    let module = ModuleRegistration::builder("catalog")
        .dep("db", &DB)
        .consumes(CapabilityRef::service("core.config"))
        .build();

    assert_eq!(module.deps().get("db"), Some(&DB.erase()));
    assert!(module.consumes().contains(&DB.erase()));
    assert!(module.consumes().contains(&CapabilityRef::service("core.config")));
    assert!(module.provides().is_empty());
}

#[test]
fn test_extension_point_is_provided() {
    let module = ModuleRegistration::builder("catalog")
        .extension_point(&ROUTES, Arc::new(Routes))
        .build();

    assert!(module.provides().contains(&ROUTES.erase()));
    assert!(module.extension_points().contains_key(&ROUTES.erase()));
}

#[tokio::test]
async fn test_init_can_be_taken_once() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let mut module = ModuleRegistration::builder("m").init(move |_deps| async move {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    });

    let init = module.take_init().expect("init should be present");
    init(ResolvedDeps::new()).await.expect("init should succeed");
    assert!(ran.load(Ordering::SeqCst));
    assert!(module.take_init().is_none());
}

#[tokio::test]
async fn test_shutdown_hook() {
    let mut module = ModuleRegistration::builder("m")
        .on_shutdown(|| async { Ok(()) })
        .build();
    assert!(module.has_shutdown_hook());
    let hook = module.take_shutdown().expect("hook should be present");
    hook().await.expect("hook should succeed");
    assert!(!module.has_shutdown_hook());
}
