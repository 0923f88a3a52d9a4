//! Per-key mutual exclusion for read-then-write backends.
//!
//! The table only holds entries for keys that currently have a holder or a
//! waiter. When the last [`KeyGuard`] for a key is dropped and nobody is
//! queued behind it, the entry is removed, so the table is bounded by the
//! number of in-flight keys.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::{Namespace, NaturalKey};

type LockKey = (Namespace, NaturalKey);
type LockTable = HashMap<LockKey, Arc<AsyncMutex<()>>>;

/// A table of async locks, one per in-flight `(namespace, key)`.
#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Mutex<LockTable>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other task holds the lock for `(namespace, key)`.
    ///
    /// Different keys never block each other.
    pub async fn lock(&self, namespace: &Namespace, key: &NaturalKey) -> KeyGuard<'_> {
        let slot = (namespace.clone(), key.clone());

        // Declared before the wait so that, if this future is dropped while
        // queued, it is dropped last and still evicts the entry.
        let mut pending = KeyGuard {
            locks: self,
            slot: Some(slot.clone()),
            guard: None,
        };

        // Cloning the Arc under the table lock is what makes eviction safe:
        // the strong count only grows while the table is locked.
        let mutex = Arc::clone(self.table().entry(slot).or_default());
        pending.guard = Some(mutex.lock_owned().await);
        pending
    }

    /// Number of keys with a holder or waiter.
    pub fn in_flight(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> MutexGuard<'_, LockTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, slot: LockKey) {
        let mut table = self.table();
        let idle = table
            .get(&slot)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1);
        if idle {
            table.remove(&slot);
        }
    }
}

/// Holds the lock for one `(namespace, key)` until dropped.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    slot: Option<LockKey>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so our own Arc clone no longer counts.
        drop(self.guard.take());
        if let Some(slot) = self.slot.take() {
            self.locks.release(slot);
        }
    }
}
