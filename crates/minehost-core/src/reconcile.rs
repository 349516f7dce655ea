use crate::lifecycle::LifecycleState;
use crate::CoreError;
use minehost_engine::{container_name, ContainerEngine};
use minehost_store::{ServerId, ServerStore, StoreError, Transition};
use std::sync::Arc;
use tracing::{debug, warn};

/// A server's status as best known right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedStatus {
    pub status: LifecycleState,
    /// Short container id, only when the engine answered.
    pub container_id: Option<String>,
    /// The engine's own status string (`running`, `exited`, ...).
    pub runtime_status: Option<String>,
    /// True when the answer came from the store instead of the engine.
    pub simulated: bool,
}

/// Resolves live container state against the persisted status, preferring the
/// engine's view. Never writes a status.
pub struct StatusReconciler {
    store: Arc<dyn ServerStore>,
    engine: Arc<dyn ContainerEngine>,
}

impl StatusReconciler {
    pub fn new(store: Arc<dyn ServerStore>, engine: Arc<dyn ContainerEngine>) -> Self {
        Self { store, engine }
    }

    pub fn query(&self, id: &ServerId) -> Result<ObservedStatus, CoreError> {
        let name = container_name(id);

        let err = match self.engine.inspect(&name) {
            Ok(state) => {
                debug!("{name}: running={} status={}", state.running, state.runtime_status);
                return Ok(ObservedStatus {
                    status: if state.running {
                        LifecycleState::Online
                    } else {
                        LifecycleState::Offline
                    },
                    container_id: Some(state.id.short().to_owned()),
                    runtime_status: Some(state.runtime_status),
                    simulated: false,
                });
            }
            Err(e) => e,
        };

        warn!("{name}: inspect failed, using persisted status: {err}");
        let status = match self.store.get(id) {
            Ok(record) => {
                self.store.commit(
                    id,
                    &Transition::error(format!("Status check failed: {}", err.detail())),
                )?;
                LifecycleState::from(record.status)
            }
            Err(StoreError::ServerNotFound(_)) => LifecycleState::Offline,
            Err(e) => return Err(e.into()),
        };

        Ok(ObservedStatus {
            status,
            container_id: None,
            runtime_status: None,
            simulated: true,
        })
    }
}
