//! Shared fixtures for plexus-runtime tests

#![allow(dead_code)]

use plexus_domain::ports::{FactoryContext, ServiceFactory, ServiceFactoryBuilder};
use plexus_domain::{ServiceRef, ServiceScope};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Instance produced by [`counting_factory`]
#[derive(Debug)]
pub struct Built {
    /// Service id that produced this instance
    pub service: String,
    /// Requesting module for per-module services
    pub module: Option<String>,
    /// Construction sequence number, starting at 1
    pub sequence: usize,
}

/// Factory that counts how many times it constructs an instance
pub fn counting_factory(
    service: &ServiceRef<Built>,
    scope: ServiceScope,
    counter: &Arc<AtomicUsize>,
) -> Arc<dyn ServiceFactory> {
    let counter = Arc::clone(counter);
    let id = service.id().to_string();
    ServiceFactoryBuilder::new(service)
        .scope(scope)
        .build(move |ctx: FactoryContext| {
            let sequence = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let service = id.clone();
            async move {
                Ok(Built {
                    service,
                    module: ctx.module_id,
                    sequence,
                })
            }
        })
}

/// Factory with no dependencies that always succeeds
pub fn plain_factory(service: &ServiceRef<Built>) -> Arc<dyn ServiceFactory> {
    counting_factory(service, ServiceScope::Singleton, &Arc::new(AtomicUsize::new(0)))
}

/// Thread-safe ordered record of lifecycle events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events
            .lock()
            .expect("event log poisoned")
            .push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("event log poisoned").clone()
    }
}
