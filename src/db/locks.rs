//! Per-key mutual exclusion.
//!
//! Each key gets its own mutex, so read-modify-write on one session never
//! waits on another. Entries are dropped from the table once nobody holds or
//! waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering from poisoning.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct KeyedLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<R>(&self, key: &str, f: impl FnOnce() -> R) -> R {
        let slot = lock_or_recover(&self.table)
            .entry(key.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = lock_or_recover(&slot);
            f()
        };
        drop(slot);

        let mut table = lock_or_recover(&self.table);
        if table.get(key).is_some_and(|s| Arc::strong_count(s) == 1) {
            table.remove(key);
        }
        result
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        lock_or_recover(&self.table).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
