//! Idempotent inserts over stores that only offer plain reads and writes.
//!
//! A document database without a create-if-absent primitive admits a race
//! between "key is absent" and "write the key": two deliveries can both see
//! the key missing and both write. [`SerializedStore`] closes that window by
//! holding a per-key lock from the read until the write has completed.
//!
//! This is the extension point for external document stores. A deployment
//! that keeps notifications in such a store implements [`DocumentBackend`]
//! for its client and hands `Arc::new(SerializedStore::new(client))` to
//! [`AppState::with_store`](crate::server::AppState::with_store).
//! [`open`](super::open) only builds the backends that ship with the crate.
//!
//! The lock is process-local. Running more than one relay process against
//! the same backend requires a backend with a native conditional write.

use async_trait::async_trait;

use super::locks::KeyLocks;
use super::{
    InsertOutcome, NotificationStore, Result, StoredNotification, validate_key,
    validate_namespace,
};
use crate::types::{Namespace, NaturalKey};

/// A document store with get and unconditional put.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn get(&self, namespace: &Namespace, key: &NaturalKey)
    -> Result<Option<StoredNotification>>;

    /// Writes `doc`, replacing any existing document with the same key.
    async fn put(&self, namespace: &Namespace, key: &NaturalKey, doc: &StoredNotification)
    -> Result<()>;
}

/// Makes a [`DocumentBackend`] safe for idempotent inserts.
#[derive(Debug, Default)]
pub struct SerializedStore<B> {
    backend: B,
    locks: KeyLocks,
}

impl<B: DocumentBackend> SerializedStore<B> {
    pub fn new(backend: B) -> Self {
        SerializedStore {
            backend,
            locks: KeyLocks::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of keys currently being inserted.
    pub fn in_flight(&self) -> usize {
        self.locks.in_flight()
    }
}

#[async_trait]
impl<B: DocumentBackend> NotificationStore for SerializedStore<B> {
    async fn try_insert(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
        doc: StoredNotification,
    ) -> Result<InsertOutcome> {
        validate_namespace(namespace)?;
        validate_key(key)?;

        let _guard = self.locks.lock(namespace, key).await;

        if self.backend.get(namespace, key).await?.is_some() {
            return Ok(InsertOutcome::Duplicate);
        }
        self.backend.put(namespace, key, &doc).await?;
        Ok(InsertOutcome::Created)
    }

    async fn get(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
    ) -> Result<Option<StoredNotification>> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        self.backend.get(namespace, key).await
    }
}
