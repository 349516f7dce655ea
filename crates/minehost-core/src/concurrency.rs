use minehost_store::ServerId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-process mutual exclusion keyed by server id.
///
/// Mutating actions on the same server run one at a time, so the status they
/// persist always matches the order in which they ran. Different servers never
/// block each other. Entries are dropped once no caller holds or waits on them.
#[derive(Default)]
pub struct ServerLocks {
    slots: Mutex<HashMap<ServerId, Arc<Mutex<()>>>>,
}

impl ServerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `id`.
    pub fn serialize<T>(&self, id: &ServerId, f: impl FnOnce() -> T) -> T {
        let slot = Arc::clone(self.slots().entry(id.clone()).or_default());

        let result = {
            let _held = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut slots = self.slots();
        // One reference in the map, one here: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(id);
        }
        result
    }

    /// Number of servers with an action in flight or queued.
    pub fn tracked(&self) -> usize {
        self.slots().len()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ServerId, Arc<Mutex<()>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
