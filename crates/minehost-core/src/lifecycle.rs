use crate::Action;
use minehost_engine::LifecycleOp;
use minehost_store::ServerStatus;
use std::fmt;

/// Status as seen by the state machine. `Unknown` is a record that has never
/// been acted on; `Offline` is the rest state. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unknown,
    Creating,
    Starting,
    Online,
    Offline,
}

impl From<Option<ServerStatus>> for LifecycleState {
    fn from(status: Option<ServerStatus>) -> Self {
        match status {
            None => LifecycleState::Unknown,
            Some(ServerStatus::Creating) => LifecycleState::Creating,
            Some(ServerStatus::Starting) => LifecycleState::Starting,
            Some(ServerStatus::Online) => LifecycleState::Online,
            Some(ServerStatus::Offline) => LifecycleState::Offline,
        }
    }
}

impl From<ServerStatus> for LifecycleState {
    fn from(status: ServerStatus) -> Self {
        Some(status).into()
    }
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Unknown => "unknown",
            LifecycleState::Creating => "creating",
            LifecycleState::Starting => "starting",
            LifecycleState::Online => "online",
            LifecycleState::Offline => "offline",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine work an action requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStep {
    /// Create the container from a fresh spec, then start it by id.
    CreateAndStart,
    /// Start, stop, or restart the existing container by name.
    Lifecycle(LifecycleOp),
}

/// What to do for one action and where the persisted status ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub action: Action,
    pub from: LifecycleState,
    pub step: EngineStep,
    pub on_success: ServerStatus,
    /// `None` leaves the persisted status untouched.
    pub on_failure: Option<ServerStatus>,
}

/// The transition table.
///
/// Lifecycle ops persist their target whether or not the engine call worked:
/// the store records intent. `create` only moves the status when a container
/// was actually provisioned.
pub fn plan(action: Action, from: LifecycleState) -> Plan {
    let (step, on_success, on_failure) = match action {
        Action::Create => (EngineStep::CreateAndStart, ServerStatus::Starting, None),
        Action::Start => (
            EngineStep::Lifecycle(LifecycleOp::Start),
            ServerStatus::Online,
            Some(ServerStatus::Online),
        ),
        Action::Stop => (
            EngineStep::Lifecycle(LifecycleOp::Stop),
            ServerStatus::Offline,
            Some(ServerStatus::Offline),
        ),
        Action::Restart => (
            EngineStep::Lifecycle(LifecycleOp::Restart),
            ServerStatus::Online,
            Some(ServerStatus::Online),
        ),
    };

    Plan {
        action,
        from,
        step,
        on_success,
        on_failure,
    }
}
