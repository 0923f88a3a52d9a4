//! Process-local notification store.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{
    InsertOutcome, NotificationStore, Result, StoredNotification, validate_key,
    validate_namespace,
};
use crate::types::{Namespace, NaturalKey};

type DocumentMap = HashMap<(Namespace, NaturalKey), StoredNotification>;

/// In-memory store for tests and ephemeral deployments.
///
/// The check and the insert happen under a single lock that is never held
/// across an await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<DocumentMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across all namespaces.
    pub fn len(&self) -> usize {
        self.docs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of documents in one namespace.
    pub fn count(&self, namespace: &Namespace) -> usize {
        self.docs().keys().filter(|(ns, _)| ns == namespace).count()
    }

    fn docs(&self) -> MutexGuard<'_, DocumentMap> {
        // A panic while holding the lock cannot leave a half-inserted entry,
        // so the map is still consistent.
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn try_insert(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
        doc: StoredNotification,
    ) -> Result<InsertOutcome> {
        validate_namespace(namespace)?;
        validate_key(key)?;

        match self.docs().entry((namespace.clone(), key.clone())) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(doc);
                Ok(InsertOutcome::Created)
            }
        }
    }

    async fn get(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
    ) -> Result<Option<StoredNotification>> {
        validate_namespace(namespace)?;
        validate_key(key)?;

        Ok(self
            .docs()
            .get(&(namespace.clone(), key.clone()))
            .cloned())
    }
}
