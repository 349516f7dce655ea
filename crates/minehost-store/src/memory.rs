use crate::logs::{LogEntry, Transition};
use crate::records::{allocate_port, next_id, sort_newest_first, NewServer, ServerId, ServerRecord};
use crate::{ServerStore, StoreError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    records: BTreeMap<ServerId, ServerRecord>,
    logs: Vec<LogEntry>,
    offline: bool,
}

/// In-process [`ServerStore`], used by tests and by tooling that does not need
/// durability. Can be switched offline to exercise persistence failures.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record verbatim, bypassing id and port allocation.
    pub fn insert(&self, record: ServerRecord) -> Result<(), StoreError> {
        let mut inner = self.state()?;
        inner.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// While offline every operation fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        match self.inner.lock() {
            Ok(mut inner) => inner.offline = offline,
            Err(poisoned) => poisoned.into_inner().offline = offline,
        }
    }

    /// Every log entry across all servers, oldest first.
    pub fn all_logs(&self) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self.state()?.logs.clone())
    }

    fn state(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StoreError::LockFailed(format!("mutex poisoned: {e}")))?;
        if inner.offline {
            return Err(StoreError::Unavailable("memory store is offline".to_owned()));
        }
        Ok(inner)
    }
}

impl ServerStore for MemoryStore {
    fn get(&self, id: &ServerId) -> Result<ServerRecord, StoreError> {
        self.state()?
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ServerNotFound(id.to_string()))
    }

    fn list(&self, owner: &str) -> Result<Vec<ServerRecord>, StoreError> {
        let mut records: Vec<ServerRecord> = self
            .state()?
            .records
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn register(&self, new: &NewServer) -> Result<ServerRecord, StoreError> {
        new.validate()?;
        let mut inner = self.state()?;

        let id = next_id(inner.records.keys());
        let used: Vec<u16> = inner.records.values().map(|r| r.port).collect();
        let port = allocate_port(&used)?;

        let now = chrono::Utc::now().to_rfc3339();
        let record = new.clone().into_record(id, port, &now);
        let entry = Transition::info(format!("Server {} created successfully", record.name))
            .entry(&record.id, &now);
        inner.records.insert(record.id.clone(), record.clone());
        inner.logs.push(entry);
        Ok(record)
    }

    fn commit(&self, id: &ServerId, transition: &Transition) -> Result<(), StoreError> {
        let mut inner = self.state()?;
        let now = chrono::Utc::now().to_rfc3339();
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::ServerNotFound(id.to_string()))?;
        if let Some(status) = transition.status {
            record.status = Some(status);
            record.updated_at.clone_from(&now);
        }
        inner.logs.push(transition.entry(id, &now));
        Ok(())
    }

    fn logs(&self, id: &ServerId, limit: usize) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self
            .state()?
            .logs
            .iter()
            .rev()
            .filter(|e| e.server_id == *id)
            .take(limit)
            .cloned()
            .collect())
    }
}
