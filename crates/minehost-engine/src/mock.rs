use crate::spec::{ContainerName, ContainerSpec};
use crate::{ContainerEngine, ContainerId, ContainerState, EngineError, LifecycleOp};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A failure the mock engine can be told to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// The engine cannot be reached at all.
    Unreachable,
    /// The engine answers with this HTTP status and body.
    Status { code: u16, body: String },
    /// The engine does not answer within this timeout.
    Timeout(Duration),
}

impl MockFailure {
    fn to_error(&self) -> EngineError {
        match self {
            MockFailure::Unreachable => {
                EngineError::Transport("connection refused (mock engine offline)".to_owned())
            }
            MockFailure::Status { code, body } => EngineError::Status {
                code: *code,
                body: body.clone(),
            },
            MockFailure::Timeout(after) => EngineError::Timeout(*after),
        }
    }
}

/// One call made against the mock, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Create(String),
    Start(String),
    Lifecycle(String, LifecycleOp),
    Inspect(String),
}

struct MockContainer {
    id: ContainerId,
    running: bool,
    status: &'static str,
}

#[derive(Default)]
struct MockState {
    containers: HashMap<String, MockContainer>,
    calls: Vec<EngineCall>,
    failure: Option<MockFailure>,
    start_failure: Option<MockFailure>,
    created: u64,
}

/// In-memory container engine with failure injection and a call journal.
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (`None` heals the engine).
    pub fn set_failure(&self, failure: Option<MockFailure>) {
        self.lock().failure = failure;
    }

    /// Make only the post-create `start` call fail.
    pub fn set_start_failure(&self, failure: Option<MockFailure>) {
        self.lock().start_failure = failure;
    }

    /// Place a container directly, as if created out of band.
    pub fn seed(&self, name: &ContainerName, id: &str, running: bool) {
        self.lock().containers.insert(
            name.as_str().to_owned(),
            MockContainer {
                id: ContainerId::new(id),
                running,
                status: if running { "running" } else { "exited" },
            },
        );
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    pub fn is_running(&self, name: &ContainerName) -> Option<bool> {
        self.lock().containers.get(name.as_str()).map(|c| c.running)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn begin(&self, call: EngineCall) -> Result<MutexGuard<'_, MockState>, EngineError> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(err) = state.failure.as_ref().map(MockFailure::to_error) {
            return Err(err);
        }
        Ok(state)
    }
}

fn no_such_container(what: &str) -> EngineError {
    EngineError::Status {
        code: 404,
        body: format!("{{\"message\":\"No such container: {what}\"}}"),
    }
}

impl ContainerEngine for MockEngine {
    fn create(
        &self,
        name: &ContainerName,
        _spec: &ContainerSpec,
    ) -> Result<ContainerId, EngineError> {
        let mut state = self.begin(EngineCall::Create(name.as_str().to_owned()))?;
        if state.containers.contains_key(name.as_str()) {
            return Err(EngineError::Status {
                code: 409,
                body: format!(
                    "{{\"message\":\"Conflict. The container name \\\"/{name}\\\" is already in use\"}}"
                ),
            });
        }

        state.created += 1;
        let id = blake3::hash(format!("{name}:{}", state.created).as_bytes())
            .to_hex()
            .to_string();
        let id = ContainerId::new(id);
        state.containers.insert(
            name.as_str().to_owned(),
            MockContainer {
                id: id.clone(),
                running: false,
                status: "created",
            },
        );
        Ok(id)
    }

    fn start(&self, id: &ContainerId) -> Result<(), EngineError> {
        let mut state = self.begin(EngineCall::Start(id.as_str().to_owned()))?;
        if let Some(err) = state.start_failure.as_ref().map(MockFailure::to_error) {
            return Err(err);
        }
        let container = state
            .containers
            .values_mut()
            .find(|c| c.id.as_str().starts_with(id.as_str()))
            .ok_or_else(|| no_such_container(id.as_str()))?;
        container.running = true;
        container.status = "running";
        Ok(())
    }

    fn lifecycle(&self, name: &ContainerName, op: LifecycleOp) -> Result<(), EngineError> {
        let mut state = self.begin(EngineCall::Lifecycle(name.as_str().to_owned(), op))?;
        let container = state
            .containers
            .get_mut(name.as_str())
            .ok_or_else(|| no_such_container(name.as_str()))?;
        let running = !matches!(op, LifecycleOp::Stop);
        container.running = running;
        container.status = if running { "running" } else { "exited" };
        Ok(())
    }

    fn inspect(&self, name: &ContainerName) -> Result<ContainerState, EngineError> {
        let state = self.begin(EngineCall::Inspect(name.as_str().to_owned()))?;
        let container = state
            .containers
            .get(name.as_str())
            .ok_or_else(|| no_such_container(name.as_str()))?;
        Ok(ContainerState {
            id: container.id.clone(),
            running: container.running,
            runtime_status: container.status.to_owned(),
        })
    }
}
