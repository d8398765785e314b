//! Capability references
//!
//! A capability is anything a module can provide or consume. It is named by a
//! [`CapabilityRef`], an immutable `(kind, id)` pair that also remembers the
//! Rust type it stands for, purely for diagnostics.
//!
//! Typed references ([`ServiceRef`] and [`ExtensionPointRef`]) are what
//! authors declare as constants; they erase into [`CapabilityRef`] when handed
//! to the runtime.
//!
//! ```
//! use plexus_domain::capability::{CapabilityKind, CapabilityRef, ServiceRef};
//!
//! struct Clock;
//! const CLOCK: ServiceRef<Clock> = ServiceRef::new("core.clock");
//!
//! let erased = CapabilityRef::from(&CLOCK);
//! assert_eq!(erased.id(), "core.clock");
//! assert_eq!(erased.kind(), CapabilityKind::Service);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// The two families of capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    /// Globally resolvable, possibly scoped per consuming module
    Service,
    /// Owned by exactly one module, consumed by others to extend it
    ExtensionPoint,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::ExtensionPoint => write!(f, "extension-point"),
        }
    }
}

/// How many instances a service factory produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceScope {
    /// One instance for the whole backend
    #[default]
    Singleton,
    /// One instance per consuming module id
    PerModule,
}

impl fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::PerModule => write!(f, "per-module"),
        }
    }
}

/// Type-erased capability identifier
///
/// Equality, hashing and ordering only look at `(kind, id)`.
#[derive(Clone)]
pub struct CapabilityRef {
    id: Cow<'static, str>,
    kind: CapabilityKind,
    type_name: &'static str,
}

impl CapabilityRef {
    /// Create a service reference with a runtime id
    pub fn service(id: impl Into<Cow<'static, str>>) -> Self {
        Self::untyped(id, CapabilityKind::Service)
    }

    /// Create an extension point reference with a runtime id
    pub fn extension_point(id: impl Into<Cow<'static, str>>) -> Self {
        Self::untyped(id, CapabilityKind::ExtensionPoint)
    }

    fn untyped(id: impl Into<Cow<'static, str>>, kind: CapabilityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            type_name: "unknown",
        }
    }

    /// Capability id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Capability kind
    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Name of the Rust type this capability was declared with
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this is a service reference
    pub fn is_service(&self) -> bool {
        self.kind == CapabilityKind::Service
    }

    /// Whether this is an extension point reference
    pub fn is_extension_point(&self) -> bool {
        self.kind == CapabilityKind::ExtensionPoint
    }
}

impl PartialEq for CapabilityRef {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl Eq for CapabilityRef {}

impl Hash for CapabilityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.id.hash(state);
    }
}

impl PartialOrd for CapabilityRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CapabilityRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for CapabilityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Ref{{{}}}", self.kind, self.id)
    }
}

impl fmt::Display for CapabilityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ============================================================================
// Typed references
// ============================================================================

/// Typed reference to a service producing `T`
pub struct ServiceRef<T: ?Sized> {
    id: Cow<'static, str>,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> ServiceRef<T> {
    /// Declare a service reference with a static id
    pub const fn new(id: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            _marker: PhantomData,
        }
    }

    /// Declare a service reference with a runtime id
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            id: Cow::Owned(id.into()),
            _marker: PhantomData,
        }
    }

    /// Service id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Erase the type parameter
    pub fn erase(&self) -> CapabilityRef {
        CapabilityRef {
            id: self.id.clone(),
            kind: CapabilityKind::Service,
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// Typed reference to an extension point implemented as `T`
pub struct ExtensionPointRef<T: ?Sized> {
    id: Cow<'static, str>,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> ExtensionPointRef<T> {
    /// Declare an extension point reference with a static id
    pub const fn new(id: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            _marker: PhantomData,
        }
    }

    /// Declare an extension point reference with a runtime id
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            id: Cow::Owned(id.into()),
            _marker: PhantomData,
        }
    }

    /// Extension point id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Erase the type parameter
    pub fn erase(&self) -> CapabilityRef {
        CapabilityRef {
            id: self.id.clone(),
            kind: CapabilityKind::ExtensionPoint,
            type_name: std::any::type_name::<T>(),
        }
    }
}

macro_rules! typed_ref_impls {
    ($name:ident) => {
        impl<T: ?Sized> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self {
                    id: self.id.clone(),
                    _marker: PhantomData,
                }
            }
        }

        impl<T: ?Sized> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(&self.erase(), f)
            }
        }

        impl<T: ?Sized> From<&$name<T>> for CapabilityRef {
            fn from(typed: &$name<T>) -> Self {
                typed.erase()
            }
        }

        impl<T: ?Sized> From<$name<T>> for CapabilityRef {
            fn from(typed: $name<T>) -> Self {
                typed.erase()
            }
        }
    };
}

typed_ref_impls!(ServiceRef);
typed_ref_impls!(ExtensionPointRef);

impl From<&CapabilityRef> for CapabilityRef {
    fn from(erased: &CapabilityRef) -> Self {
        erased.clone()
    }
}
