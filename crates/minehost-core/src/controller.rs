use crate::concurrency::ServerLocks;
use crate::lifecycle::{plan, EngineStep, LifecycleState, Plan};
use crate::{Action, CoreError};
use minehost_engine::{
    build_spec, container_name, ContainerEngine, ContainerId, EngineError, LifecycleOp,
};
use minehost_store::{ServerId, ServerRecord, ServerStatus, ServerStore, Transition};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a `create` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The container exists and was started; the record is now `starting`.
    Provisioned { container_id: ContainerId, port: u16 },
    /// The engine could not provision the container. Nothing but an error log
    /// entry was persisted.
    Degraded { error: String },
}

impl CreateOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            CreateOutcome::Provisioned { .. } => "Server container created and starting",
            CreateOutcome::Degraded { .. } => {
                "Using simulation mode - server created in database only"
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, CreateOutcome::Degraded { .. })
    }
}

/// Result of `start`, `stop`, or `restart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: Action,
    /// The status now persisted for the server.
    pub status: ServerStatus,
    /// True when the engine call failed and only the store was updated.
    pub simulated: bool,
}

impl ActionOutcome {
    pub fn message(&self) -> String {
        if self.simulated {
            format!("Server {} (simulation mode)", self.action)
        } else {
            format!("Server {} successful", self.action)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(CreateOutcome),
    Applied(ActionOutcome),
}

impl Outcome {
    pub fn message(&self) -> String {
        match self {
            Outcome::Created(c) => c.message().to_owned(),
            Outcome::Applied(a) => a.message(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        match self {
            Outcome::Created(c) => c.is_degraded(),
            Outcome::Applied(a) => a.simulated,
        }
    }
}

/// Drives lifecycle actions against the engine and records each transition.
///
/// Engine failures never escape as errors: they are written to the server's
/// log and reported through the outcome's degraded flag. Store failures do
/// propagate, since without the store nothing was recorded.
pub struct LifecycleController {
    store: Arc<dyn ServerStore>,
    engine: Arc<dyn ContainerEngine>,
    locks: ServerLocks,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn ServerStore>, engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            store,
            engine,
            locks: ServerLocks::new(),
        }
    }

    /// Apply `action` to server `id`.
    ///
    /// Returns [`CoreError::NotFound`] before touching the engine if the
    /// record does not exist. Actions on the same server run one at a time.
    pub fn apply(&self, id: &ServerId, action: Action) -> Result<Outcome, CoreError> {
        self.locks.serialize(id, || {
            let record = self.store.get(id)?;
            let plan = plan(action, LifecycleState::from(record.status));
            debug!(
                "server {id}: {action} from {} via {:?}",
                plan.from, plan.step
            );

            match plan.step {
                EngineStep::CreateAndStart => self.provision(&record, &plan).map(Outcome::Created),
                EngineStep::Lifecycle(op) => self.run(&record, op, &plan).map(Outcome::Applied),
            }
        })
    }

    fn provision(&self, record: &ServerRecord, plan: &Plan) -> Result<CreateOutcome, CoreError> {
        let name = container_name(&record.id);
        let spec = build_spec(record);

        let container_id = match self.engine.create(&name, &spec) {
            Ok(cid) => cid,
            Err(e) => {
                let message = format!("Failed to create container: {}", e.detail());
                return self.degrade_create(record, message, &e);
            }
        };

        if let Err(e) = self.engine.start(&container_id) {
            let message = format!(
                "Failed to create container: {} did not start: {}",
                container_id.short(),
                e.detail()
            );
            return self.degrade_create(record, message, &e);
        }

        let transition = Transition::info(format!("Container created: {}", container_id.short()))
            .with_status(plan.on_success);
        self.store.commit(&record.id, &transition)?;
        info!(
            "server {}: container {} created, now {}",
            record.id,
            container_id.short(),
            plan.on_success
        );

        Ok(CreateOutcome::Provisioned {
            container_id,
            port: record.port,
        })
    }

    fn degrade_create(
        &self,
        record: &ServerRecord,
        message: String,
        cause: &EngineError,
    ) -> Result<CreateOutcome, CoreError> {
        warn!("server {}: create degraded to simulation mode: {cause}", record.id);
        self.store.commit(&record.id, &Transition::error(message))?;
        Ok(CreateOutcome::Degraded {
            error: cause.to_string(),
        })
    }

    fn run(
        &self,
        record: &ServerRecord,
        op: LifecycleOp,
        plan: &Plan,
    ) -> Result<ActionOutcome, CoreError> {
        let name = container_name(&record.id);

        match self.engine.lifecycle(&name, op) {
            Ok(()) => {
                let transition = Transition::info(format!("Container {op} completed"))
                    .with_status(plan.on_success);
                self.store.commit(&record.id, &transition)?;
                info!("server {}: {op} completed, now {}", record.id, plan.on_success);
                Ok(ActionOutcome {
                    action: plan.action,
                    status: plan.on_success,
                    simulated: false,
                })
            }
            Err(e) => {
                warn!("server {}: {op} degraded to simulation mode: {e}", record.id);
                let mut transition =
                    Transition::error(format!("Container {op} failed: {}", e.detail()));
                if let Some(status) = plan.on_failure {
                    transition = transition.with_status(status);
                }
                self.store.commit(&record.id, &transition)?;
                Ok(ActionOutcome {
                    action: plan.action,
                    status: plan.on_failure.unwrap_or(plan.on_success),
                    simulated: true,
                })
            }
        }
    }
}
