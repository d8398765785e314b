//! Backend tuning options

use crate::constants::DEFAULT_SHUTDOWN_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How module initializers are scheduled during `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitStrategy {
    /// One module at a time, in topological order
    #[default]
    Sequential,
    /// Every module as soon as the modules it depends on have initialized
    Concurrent,
}

impl fmt::Display for InitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// Backend options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    /// Initializer scheduling
    pub init_strategy: InitStrategy,

    /// Per-module initializer budget; unlimited when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_timeout_ms: Option<u64>,

    /// Per-module shutdown hook budget
    pub shutdown_timeout_ms: u64,
}

impl BackendOptions {
    /// Initializer budget as a duration
    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }

    /// Shutdown hook budget as a duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Set the initializer scheduling
    pub fn with_init_strategy(mut self, strategy: InitStrategy) -> Self {
        self.init_strategy = strategy;
        self
    }

    /// Set the per-module initializer budget
    pub fn with_init_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.init_timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the per-module shutdown hook budget
    pub fn with_shutdown_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.shutdown_timeout_ms = timeout_ms;
        self
    }
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            init_strategy: InitStrategy::default(),
            init_timeout_ms: None,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}
