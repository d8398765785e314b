//! Unit tests for capability references

use plexus_domain::{CapabilityKind, CapabilityRef, ExtensionPointRef, ServiceRef, ServiceScope};
use std::collections::{BTreeSet, HashSet};

struct Logger;
struct Router;

const LOGGER: ServiceRef<Logger> = ServiceRef::new("core.logger");
const ROUTES: ExtensionPointRef<Router> = ExtensionPointRef::new("catalog.routes");

#[test]
fn test_typed_ref_erases_with_kind_and_type() {
    let erased = LOGGER.erase();
    assert_eq!(erased.id(), "core.logger");
    assert_eq!(erased.kind(), CapabilityKind::Service);
    assert!(erased.type_name().ends_with("Logger"));
    assert!(erased.is_service());

    let point = CapabilityRef::from(&ROUTES);
    assert_eq!(point.kind(), CapabilityKind::ExtensionPoint);
    assert!(point.is_extension_point());
}

#[test]
fn test_equality_is_structural_on_kind_and_id() {
    // Type tag is diagnostic only
    assert_eq!(LOGGER.erase(), CapabilityRef::service("core.logger"));
    assert_ne!(
        CapabilityRef::service("shared"),
        CapabilityRef::extension_point("shared")
    );

    let mut set = HashSet::new();
    set.insert(LOGGER.erase());
    set.insert(CapabilityRef::service("core.logger"));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_ordering_groups_services_before_extension_points() {
    let refs: BTreeSet<CapabilityRef> = [
        CapabilityRef::extension_point("a"),
        CapabilityRef::service("z"),
        CapabilityRef::service("b"),
    ]
    .into_iter()
    .collect();

    let ids: Vec<&str> = refs.iter().map(CapabilityRef::id).collect();
    assert_eq!(ids, vec!["b", "z", "a"]);
}

#[test]
fn test_runtime_named_refs() {
    let dynamic: ServiceRef<Logger> = ServiceRef::named(format!("tenant.{}", 7));
    assert_eq!(dynamic.id(), "tenant.7");
    assert_eq!(dynamic.clone().erase().id(), "tenant.7");
}

#[test]
fn test_display_and_debug() {
    assert_eq!(LOGGER.erase().to_string(), "core.logger");
    assert_eq!(format!("{:?}", ROUTES), "extension-pointRef{catalog.routes}");
}

#[test]
fn test_scope_default_and_serialization() {
    assert_eq!(ServiceScope::default(), ServiceScope::Singleton);
    let json = serde_json::to_string(&ServiceScope::PerModule).expect("serialization failed");
    assert_eq!(json, "\"per-module\"");
}
