//! Client side of the container engine's HTTP control API.
//!
//! The [`ContainerEngine`] trait is the four-call contract the lifecycle core
//! relies on (create, start, lifecycle op, inspect). [`http::HttpEngine`] speaks
//! the engine's REST API with per-call timeouts and no retries;
//! [`mock::MockEngine`] is an in-memory stand-in with failure injection.
//! [`spec`] derives container names and runtime specs from server records.

pub mod config;
pub mod http;
pub mod mock;
pub mod spec;

pub use config::{EngineConfig, EngineTimeouts, DEFAULT_ENGINE_URL};
pub use http::HttpEngine;
pub use mock::{EngineCall, MockEngine, MockFailure};
pub use spec::{build_spec, container_name, ContainerName, ContainerSpec};

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Length of the display form of a container id.
pub const SHORT_ID_LEN: usize = 12;

/// Every way an engine call can fail. All of them mean the engine could not
/// be relied on for this request; callers decide how to degrade.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("engine unreachable: {0}")]
    Transport(String),
    #[error("engine call timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("invalid engine response: {0}")]
    InvalidResponse(String),
    #[error("engine config error: {0}")]
    Config(String),
}

impl EngineError {
    /// The raw engine error body when the engine answered, else the error text.
    pub fn detail(&self) -> String {
        match self {
            EngineError::Status { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Engine-assigned container id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form: the first 12 characters.
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_ID_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Start,
    Stop,
    Restart,
}

impl LifecycleOp {
    /// Path segment used by the engine API.
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleOp::Start => "start",
            LifecycleOp::Stop => "stop",
            LifecycleOp::Restart => "restart",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live view of a container as reported by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    pub id: ContainerId,
    pub running: bool,
    /// Engine's own status word (`running`, `exited`, ...), passed through.
    pub runtime_status: String,
}

/// The container engine contract. One attempt per call, no retries.
pub trait ContainerEngine: Send + Sync {
    /// Create a container named `name` from `spec`.
    fn create(&self, name: &ContainerName, spec: &ContainerSpec)
        -> Result<ContainerId, EngineError>;

    /// Start a freshly created container by id.
    fn start(&self, id: &ContainerId) -> Result<(), EngineError>;

    /// Start, stop, or restart an existing container by name.
    fn lifecycle(&self, name: &ContainerName, op: LifecycleOp) -> Result<(), EngineError>;

    /// Report the container's live state.
    fn inspect(&self, name: &ContainerName) -> Result<ContainerState, EngineError>;
}
