//! Backend Orchestrator
//!
//! Owns the service holder and the registered modules, and drives the
//! lifecycle state machine.
//!
//! ## Lifecycle
//!
//! ```text
//! add() ──▶ Created ──start()──▶ Starting ──ok──▶ Running ──stop()──▶ Stopping ──▶ Stopped
//!                                   │                                    ▲
//!                                   └──error──▶ Failed ──stop()──────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let backend = create_specialized_backend(CreateBackendOptions::new(vec![db_factory.into()]))?;
//! backend.add(catalog_module)?;
//! backend.start().await?;
//! // ...
//! backend.stop().await?;
//! ```

use crate::constants::{START_OPERATION, STOP_OPERATION};
use crate::graph::{self, InitPlan};
use crate::holder::DefaultServiceHolder;
use crate::options::{BackendOptions, InitStrategy};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use plexus_domain::error::{Error, Result, ShutdownFailure};
use plexus_domain::ports::FactorySource;
use plexus_domain::{
    CapabilityRef, InitFn, Instance, LifecycleState, ModuleRegistration, ResolvedDeps, ShutdownFn,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Input to [`create_specialized_backend`]
#[derive(Debug, Default)]
pub struct CreateBackendOptions {
    /// Service factories, pre-built or produced on demand
    pub services: Vec<FactorySource>,
    /// Backend tuning
    pub options: BackendOptions,
}

impl CreateBackendOptions {
    /// Options with the given factories and default tuning
    pub fn new(services: Vec<FactorySource>) -> Self {
        Self {
            services,
            options: BackendOptions::default(),
        }
    }

    /// Replace the tuning options
    pub fn with_options(mut self, options: BackendOptions) -> Self {
        self.options = options;
        self
    }
}

/// Create a backend from a set of service factories
///
/// Lazy factory sources are invoked here, once. Fails before returning a
/// handle when two factories provide the same service id (every duplicate
/// is listed) or when a singleton factory depends on a per-module service.
pub fn create_specialized_backend(options: CreateBackendOptions) -> Result<Backend> {
    let factories = options
        .services
        .into_iter()
        .map(FactorySource::into_factory)
        .collect();
    let holder = DefaultServiceHolder::new(factories)?;
    Ok(Backend::new(holder, options.options))
}

/// A module that completed its initializer
struct InitializedModule {
    id: String,
    shutdown: Option<ShutdownFn>,
}

struct BackendInner {
    state: LifecycleState,
    module_ids: Vec<String>,
    pending: Vec<ModuleRegistration>,
    initialized: Vec<InitializedModule>,
}

/// Runtime handle composing modules and services
pub struct Backend {
    holder: DefaultServiceHolder,
    options: BackendOptions,
    inner: Mutex<BackendInner>,
}

impl Backend {
    /// Create a backend around an existing service holder
    pub fn new(holder: DefaultServiceHolder, options: BackendOptions) -> Self {
        Self {
            holder,
            options,
            inner: Mutex::new(BackendInner {
                state: LifecycleState::Created,
                module_ids: Vec::new(),
                pending: Vec::new(),
                initialized: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BackendInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: LifecycleState) {
        let mut inner = self.lock();
        debug!(from = %inner.state, to = %state, "Backend state transition");
        inner.state = state;
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    /// Ids of every added module, in registration order
    pub fn module_ids(&self) -> Vec<String> {
        self.lock().module_ids.clone()
    }

    /// Ids of the modules whose initializer completed, in completion order
    pub fn initialized_modules(&self) -> Vec<String> {
        self.lock()
            .initialized
            .iter()
            .map(|module| module.id.clone())
            .collect()
    }

    /// The service holder used to resolve module dependencies
    pub fn service_holder(&self) -> &DefaultServiceHolder {
        &self.holder
    }

    /// Tuning options
    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    /// Register a module
    ///
    /// Only allowed before `start`; fails with [`Error::LateRegistration`]
    /// afterwards and with [`Error::DuplicateModule`] for a repeated id.
    pub fn add(&self, module: ModuleRegistration) -> Result<()> {
        let mut inner = self.lock();
        if !inner.state.accepts_registrations() {
            return Err(Error::LateRegistration {
                module_id: module.id().to_string(),
                state: inner.state,
            });
        }
        if inner.module_ids.iter().any(|id| id == module.id()) {
            return Err(Error::DuplicateModule {
                module_id: module.id().to_string(),
            });
        }

        debug!(module = %module.id(), "Module registered");
        inner.module_ids.push(module.id().to_string());
        inner.pending.push(module);
        Ok(())
    }

    /// Validate the module graph and initialize every module
    ///
    /// Structural problems (duplicate providers, unknown capabilities, cycles)
    /// abort before any initializer runs. The first initializer failure
    /// aborts the rest; modules that already completed stay recorded so
    /// `stop` can unwind them.
    pub async fn start(&self) -> Result<()> {
        let mut modules = {
            let mut inner = self.lock();
            if inner.state != LifecycleState::Created {
                return Err(Error::InvalidState {
                    operation: START_OPERATION,
                    state: inner.state,
                });
            }
            inner.state = LifecycleState::Starting;
            std::mem::take(&mut inner.pending)
        };
        let guard = StartGuard::new(self);

        info!(
            modules = modules.len(),
            strategy = %self.options.init_strategy,
            "Starting backend"
        );
        let started = Instant::now();

        let plan = match graph::resolve(&modules, &self.holder) {
            Ok(plan) => plan,
            Err(error) => {
                error!(
                    error = %error,
                    structural = error.is_structural(),
                    "Backend graph validation failed"
                );
                guard.disarm();
                self.set_state(LifecycleState::Failed);
                return Err(error);
            }
        };
        debug!(order = ?plan.ordered_ids(&modules), "Module initialization order");

        let outcome = self.run_initializers(&mut modules, &plan).await;
        guard.disarm();
        match outcome {
            Ok(()) => {
                self.set_state(LifecycleState::Running);
                info!(
                    modules = modules.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Backend started"
                );
                Ok(())
            }
            Err(error) => {
                error!(error = %error, "Backend startup failed");
                self.set_state(LifecycleState::Failed);
                Err(error)
            }
        }
    }

    /// Run initializers following the plan; returns the first failure
    async fn run_initializers(
        &self,
        modules: &mut [ModuleRegistration],
        plan: &InitPlan,
    ) -> Result<()> {
        let extension_points = collect_extension_points(modules);
        let concurrent = self.options.init_strategy == InitStrategy::Concurrent;

        let mut launched = vec![false; modules.len()];
        let mut done = vec![false; modules.len()];
        let mut in_flight = FuturesUnordered::new();
        let mut first_failure: Option<Error> = None;

        loop {
            if first_failure.is_none() {
                for &index in &plan.order {
                    if !concurrent && !in_flight.is_empty() {
                        break;
                    }
                    if launched[index] || !plan.dependencies[index].iter().all(|&dep| done[dep]) {
                        continue;
                    }
                    launched[index] = true;

                    let module = &mut modules[index];
                    let task = InitTask {
                        module_id: module.id().to_string(),
                        deps: module.deps().clone(),
                        init: module.take_init(),
                    };
                    let holder = &self.holder;
                    let extension_points = &extension_points;
                    let timeout = self.options.init_timeout();
                    in_flight.push(async move {
                        let result = task.run(holder, extension_points, timeout).await;
                        (index, result)
                    });
                }
            }

            let Some((index, result)) = in_flight.next().await else {
                break;
            };
            let module_id = modules[index].id().to_string();
            match result {
                Ok(()) => {
                    done[index] = true;
                    let shutdown = modules[index].take_shutdown();
                    self.lock().initialized.push(InitializedModule {
                        id: module_id.clone(),
                        shutdown,
                    });
                    debug!(module = %module_id, "Module initialized");
                }
                Err(error) if first_failure.is_none() => {
                    warn!(module = %module_id, error = %error, "Module initialization failed");
                    first_failure = Some(Error::module_init(module_id, error));
                }
                Err(error) => {
                    warn!(
                        module = %module_id,
                        error = %error,
                        "Module initialization failed after startup was aborted"
                    );
                }
            }
        }

        first_failure.map_or(Ok(()), Err)
    }

    /// Shut down every initialized module in reverse initialization order
    ///
    /// A no-op from `Created` or `Stopped`. Every shutdown hook runs even if
    /// an earlier one fails; failures are returned together as
    /// [`Error::Shutdown`].
    pub async fn stop(&self) -> Result<()> {
        let initialized = {
            let mut inner = self.lock();
            match inner.state {
                LifecycleState::Created | LifecycleState::Stopped => {
                    debug!(state = %inner.state, "Stop requested with nothing to unwind");
                    return Ok(());
                }
                state if state.can_unwind() => {
                    inner.state = LifecycleState::Stopping;
                    std::mem::take(&mut inner.initialized)
                }
                state => {
                    return Err(Error::InvalidState {
                        operation: STOP_OPERATION,
                        state,
                    });
                }
            }
        };

        info!(modules = initialized.len(), "Stopping backend");
        let timeout = self.options.shutdown_timeout();
        let mut failures = Vec::new();

        for module in initialized.into_iter().rev() {
            let Some(hook) = module.shutdown else {
                debug!(module = %module.id, "No shutdown hook registered");
                continue;
            };
            if let Err(error) = run_shutdown(&module.id, hook, timeout).await {
                warn!(module = %module.id, error = %error, "Module shutdown failed");
                failures.push(ShutdownFailure {
                    module_id: module.id,
                    error,
                });
            } else {
                debug!(module = %module.id, "Module shut down");
            }
        }

        self.set_state(LifecycleState::Stopped);
        if failures.is_empty() {
            info!("Backend stopped");
            Ok(())
        } else {
            error!(failures = failures.len(), "Backend stopped with shutdown failures");
            Err(Error::Shutdown { failures })
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Backend")
            .field("state", &inner.state)
            .field("modules", &inner.module_ids)
            .field("initialized", &inner.initialized.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Moves a backend abandoned mid-`start` from `Starting` to `Failed`
///
/// Dropping the `start` future (a timeout or `select!` around it) would
/// otherwise leave the modules that already initialized out of `stop`'s reach.
struct StartGuard<'a> {
    backend: &'a Backend,
    armed: bool,
}

impl<'a> StartGuard<'a> {
    fn new(backend: &'a Backend) -> Self {
        Self {
            backend,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.backend.lock();
        if inner.state == LifecycleState::Starting {
            warn!(
                initialized = inner.initialized.len(),
                "Backend start abandoned before completion"
            );
            inner.state = LifecycleState::Failed;
        }
    }
}

/// Everything needed to initialize one module, detached from its registration
struct InitTask {
    module_id: String,
    deps: BTreeMap<String, CapabilityRef>,
    init: Option<InitFn>,
}

impl InitTask {
    async fn run(
        self,
        holder: &DefaultServiceHolder,
        extension_points: &HashMap<CapabilityRef, Instance>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let init = self
            .init
            .ok_or_else(|| Error::generic(format!("module '{}' was already initialized", self.module_id)))?;

        let mut deps = ResolvedDeps::new();
        for (name, capability) in &self.deps {
            let resolved = if capability.is_service() {
                holder.resolve(capability, &self.module_id).await?
            } else {
                extension_points
                    .get(capability)
                    .cloned()
                    .ok_or_else(|| Error::unknown_capability(capability.id(), &self.module_id))?
            };
            deps.insert(name.clone(), resolved);
        }

        debug!(module = %self.module_id, deps = deps.len(), "Running module initializer");
        match timeout {
            Some(budget) => tokio::time::timeout(budget, init(deps))
                .await
                .map_err(|_| {
                    Error::timeout(format!("init of '{}'", self.module_id), millis(budget))
                })?,
            None => init(deps).await,
        }
    }
}

async fn run_shutdown(module_id: &str, hook: ShutdownFn, timeout: Duration) -> Result<()> {
    tokio::time::timeout(timeout, hook())
        .await
        .map_err(|_| Error::timeout(format!("shutdown of '{module_id}'"), millis(timeout)))?
}

fn collect_extension_points(modules: &[ModuleRegistration]) -> HashMap<CapabilityRef, Instance> {
    modules
        .iter()
        .flat_map(|module| module.extension_points().iter())
        .map(|(point, implementation)| (point.clone(), implementation.clone()))
        .collect()
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
