use crate::{
    Action, CoreError, HostConfig, LifecycleController, ObservedStatus, Outcome,
    StatusReconciler,
};
use minehost_engine::{ContainerEngine, HttpEngine};
use minehost_store::{FileStore, LogEntry, NewServer, ServerId, ServerRecord, ServerStore, StoreLayout};
use std::sync::Arc;
use tracing::info;

/// Entry point shared by the HTTP server and the CLI: a store and an engine
/// with the controller and reconciler built over them.
pub struct Manager {
    store: Arc<dyn ServerStore>,
    controller: LifecycleController,
    reconciler: StatusReconciler,
}

impl Manager {
    pub fn new(store: Arc<dyn ServerStore>, engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            controller: LifecycleController::new(Arc::clone(&store), Arc::clone(&engine)),
            reconciler: StatusReconciler::new(Arc::clone(&store), engine),
            store,
        }
    }

    /// Build from configuration. `Ok(None)` when no store directory is set.
    pub fn from_config(config: &HostConfig) -> Result<Option<Self>, CoreError> {
        config.validate()?;
        let Some(dir) = config.store_dir.as_ref() else {
            return Ok(None);
        };

        let store = FileStore::open(StoreLayout::new(dir))?;
        let engine = HttpEngine::new(&config.engine);
        info!(
            "store at {}, engine at {}",
            dir.display(),
            config.engine.base_url()
        );
        Ok(Some(Self::new(Arc::new(store), Arc::new(engine))))
    }

    pub fn apply(&self, id: &ServerId, action: Action) -> Result<Outcome, CoreError> {
        self.controller.apply(id, action)
    }

    pub fn status(&self, id: &ServerId) -> Result<ObservedStatus, CoreError> {
        self.reconciler.query(id)
    }

    pub fn register(&self, new: &NewServer) -> Result<ServerRecord, CoreError> {
        let record = self.store.register(new)?;
        info!("registered server {} ({}) on port {}", record.id, record.name, record.port);
        Ok(record)
    }

    pub fn get(&self, id: &ServerId) -> Result<ServerRecord, CoreError> {
        Ok(self.store.get(id)?)
    }

    pub fn list(&self, owner: &str) -> Result<Vec<ServerRecord>, CoreError> {
        Ok(self.store.list(owner)?)
    }

    pub fn logs(&self, id: &ServerId, limit: usize) -> Result<Vec<LogEntry>, CoreError> {
        Ok(self.store.logs(id, limit)?)
    }
}
