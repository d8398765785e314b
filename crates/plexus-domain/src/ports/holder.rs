//! Service holder port
//!
//! The contract module initializers and factories use to reach services.

use crate::capability::CapabilityRef;
use crate::error::Result;
use crate::instance::Instance;
use futures::future::BoxFuture;

/// A service instance that may still be under construction
pub type DeferredInstance = BoxFuture<'static, Result<Instance>>;

/// Lazy, memoizing access to services
pub trait ServiceHolder: Send + Sync {
    /// Deferred instance of `service` as seen by `module_id`
    ///
    /// Returns `None` only when no factory was ever registered for `service`,
    /// which is distinct from "not constructed yet".
    fn get(&self, service: &CapabilityRef, module_id: &str) -> Option<DeferredInstance>;
}

/// A [`ServiceHolder`] that can list what it knows about
pub trait EnumerableServiceHolder: ServiceHolder {
    /// Every registered service, in registration order
    fn service_refs(&self) -> Vec<CapabilityRef>;
}
