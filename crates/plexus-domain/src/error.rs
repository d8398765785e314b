//! Error handling types

use crate::lifecycle::LifecycleState;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Two or more modules claiming the same provided capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConflict {
    /// Id of the contested capability
    pub capability: String,
    /// Ids of every module that declared it, in registration order
    pub modules: Vec<String>,
}

impl fmt::Display for ProviderConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (provided by {})", self.capability, self.modules.join(", "))
    }
}

/// A shutdown hook that failed while the backend was draining
#[derive(Debug)]
pub struct ShutdownFailure {
    /// Id of the module whose shutdown hook failed
    pub module_id: String,
    /// The underlying failure
    pub error: Error,
}

impl fmt::Display for ShutdownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module_id, self.error)
    }
}

/// Main error type for the Plexus runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Two or more service factories provide the same service id
    #[error("Duplicate service implementations provided for {}", .ids.join(", "))]
    DuplicateCapability {
        /// Every duplicated service id, each listed once
        ids: Vec<String>,
    },

    /// Two or more modules provide the same capability
    ///
    /// Applies to services and extension points alike; each capability id has
    /// at most one providing module.
    #[error("Duplicate capability providers: {}", join_display(.conflicts))]
    DuplicateProvider {
        /// Every conflicting capability with its providers
        conflicts: Vec<ProviderConflict>,
    },

    /// A module with the same id was already added
    #[error("Module '{module_id}' is already registered")]
    DuplicateModule {
        /// The repeated module id
        module_id: String,
    },

    /// A dependency names a capability nobody provides
    #[error("No provider registered for capability '{capability}' (requested by '{requested_by}')")]
    UnknownCapability {
        /// Id of the missing capability
        capability: String,
        /// Module or service that asked for it
        requested_by: String,
    },

    /// The dependency graph contains a cycle
    #[error("Circular dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Members of the cycle in order, first member repeated at the end
        cycle: Vec<String>,
    },

    /// A module initializer failed
    #[error("Module '{module_id}' failed to initialize: {source}")]
    ModuleInit {
        /// Id of the failing module
        module_id: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// A module was added after the backend left the `Created` state
    #[error("Cannot add module '{module_id}' while backend is {state}")]
    LateRegistration {
        /// Id of the rejected module
        module_id: String,
        /// Backend state at the time of the call
        state: LifecycleState,
    },

    /// A lifecycle operation was requested from a state that does not allow it
    #[error("Cannot {operation} backend while it is {state}")]
    InvalidState {
        /// The requested operation (`start`, `stop`)
        operation: &'static str,
        /// Backend state at the time of the call
        state: LifecycleState,
    },

    /// One or more shutdown hooks failed; the sweep still ran to completion
    #[error("{} module(s) failed to shut down: {}", .failures.len(), join_display(.failures))]
    Shutdown {
        /// Every failure, in shutdown order
        failures: Vec<ShutdownFailure>,
    },

    /// A service factory failed; the failure is cached and shared by every requester
    #[error("Failed to create service '{service}': {source}")]
    ServiceCreate {
        /// Id of the service whose factory failed
        service: String,
        /// The cached underlying failure
        #[source]
        source: Arc<Error>,
    },

    /// A resolved dependency is missing or has an unexpected type
    #[error("Dependency '{name}' is not available as {expected}")]
    DependencyMismatch {
        /// Dependency name as declared by the consumer
        name: String,
        /// Type the consumer asked for
        expected: &'static str,
    },

    /// A singleton service depends on a per-module service
    #[error("Singleton service '{service}' cannot depend on per-module service '{dependency}'")]
    ScopeViolation {
        /// The singleton service
        service: String,
        /// Its per-module dependency
        dependency: String,
    },

    /// An operation exceeded its time budget
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// What timed out
        operation: String,
        /// The configured budget
        timeout_ms: u64,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic error from external sources
    #[error("Generic error: {0}")]
    Generic(#[from] Box<dyn std::error::Error + Send + Sync>),
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// Basic error creation methods
impl Error {
    /// Create a generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into().into())
    }

    /// Create an unknown capability error
    pub fn unknown_capability<C: Into<String>, R: Into<String>>(
        capability: C,
        requested_by: R,
    ) -> Self {
        Self::UnknownCapability {
            capability: capability.into(),
            requested_by: requested_by.into(),
        }
    }

    /// Wrap a failure raised by a module initializer
    pub fn module_init<S: Into<String>>(module_id: S, source: Error) -> Self {
        Self::ModuleInit {
            module_id: module_id.into(),
            source: Box::new(source),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// Configuration error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl Error {
    /// Whether this error was raised by graph validation rather than by a
    /// collaborator (factory, initializer or shutdown hook)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCapability { .. }
                | Self::DuplicateProvider { .. }
                | Self::DuplicateModule { .. }
                | Self::UnknownCapability { .. }
                | Self::CyclicDependency { .. }
                | Self::ScopeViolation { .. }
        )
    }
}
