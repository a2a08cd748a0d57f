//! Per-incident async locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// In-process map of incident id to async mutex.
///
/// Entries are held weakly; a lock disappears from the map once no task holds
/// or waits on it.
#[derive(Default)]
pub struct IncidentLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl IncidentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `incident_id`.
    pub async fn acquire(&self, incident_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, weak| weak.strong_count() > 0);

            match locks.get(incident_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(incident_id.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }

    /// Number of ids with a live lock.
    #[cfg(test)]
    fn len(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }
}
