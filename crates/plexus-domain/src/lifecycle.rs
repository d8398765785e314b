//! Backend lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate lifecycle state of a backend
///
/// ```text
/// Created ──▶ Starting ──▶ Running ──▶ Stopping ──▶ Stopped
///                │                        ▲
///                ▼                        │
///              Failed ────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Accepting module registrations, nothing resolved yet
    #[default]
    Created,
    /// Validating the graph and running initializers
    Starting,
    /// Every module initialized
    Running,
    /// Running shutdown hooks
    Stopping,
    /// Shutdown sweep completed
    Stopped,
    /// Startup aborted; only the modules that completed init can be unwound
    Failed,
}

impl LifecycleState {
    /// Whether `add` is allowed in this state
    pub fn accepts_registrations(self) -> bool {
        self == Self::Created
    }

    /// Whether `stop` has anything to unwind in this state
    pub fn can_unwind(self) -> bool {
        matches!(self, Self::Running | Self::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
