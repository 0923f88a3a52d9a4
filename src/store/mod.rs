//! Idempotent notification storage.
//!
//! The store records each `(namespace, key)` at most once. [`NotificationStore::try_insert`]
//! is a single logical operation: under any number of concurrent calls for the
//! same key, exactly one observes [`InsertOutcome::Created`] and every other
//! observes [`InsertOutcome::Duplicate`].
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local map, conditional insert under one lock
//! - [`FsStore`]: one JSON document per key on disk, conditional insert via an
//!   exclusive hard link of a fully written temp file
//! - [`SerializedStore`]: wraps any get/put [`DocumentBackend`] and closes the
//!   check-then-write race with per-key locks ([`KeyLocks`])
//!
//! # Document Layout
//!
//! ```text
//! { "path": "/stk-push-callback", "data": { ...validated payload... }, "ref": "837-18118467-1" }
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Namespace, NaturalKey};

pub mod fs;
pub mod fsync;
pub mod locks;
pub mod memory;
pub mod serialized;

pub use fs::FsStore;
pub use locks::{KeyGuard, KeyLocks};
pub use memory::MemoryStore;
pub use serialized::{DocumentBackend, SerializedStore};

/// The durable record of one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNotification {
    /// Route the notification arrived on.
    pub path: String,

    /// The validated payload.
    pub data: serde_json::Value,

    /// The natural key, duplicated from the document id for auditability.
    #[serde(rename = "ref")]
    pub reference: NaturalKey,
}

impl StoredNotification {
    pub fn new(path: impl Into<String>, data: serde_json::Value, reference: NaturalKey) -> Self {
        StoredNotification {
            path: path.into(),
            data,
            reference,
        }
    }
}

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertOutcome {
    /// First sighting of the key; the document was written.
    Created,
    /// The key was already stored; nothing was written.
    Duplicate,
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error talking to the backing storage.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key cannot be used as a document id.
    #[error("invalid key: contains unsafe characters: {0:?}")]
    InvalidKey(NaturalKey),

    /// Namespace cannot be used as a table name.
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(Namespace),

    /// The backend could not complete the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The at-most-once persistence primitive.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Stores `doc` under `(namespace, key)` unless the key is already present.
    ///
    /// Never overwrites. A returned error means the insert was not confirmed;
    /// the caller should treat the notification as not recorded.
    async fn try_insert(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
        doc: StoredNotification,
    ) -> Result<InsertOutcome>;

    /// Reads the document stored under `(namespace, key)`, if any.
    async fn get(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
    ) -> Result<Option<StoredNotification>>;
}

/// Longest key, in bytes, that any backend accepts.
///
/// Leaves room for the `.json` suffix under the usual 255-byte file name limit.
pub const MAX_KEY_LEN: usize = 200;

/// Validates that a key is safe to use as a document id.
///
/// A key is unsafe if it:
/// - Is empty or longer than [`MAX_KEY_LEN`] bytes
/// - Contains path separators (`/` or `\`) or null bytes
/// - Starts with a dot (hidden file, collides with temp files and `..`)
pub fn validate_key(key: &NaturalKey) -> Result<()> {
    let id = key.as_str();

    if id.is_empty()
        || id.len() > MAX_KEY_LEN
        || id.contains(['/', '\\', '\0'])
        || id.starts_with('.')
    {
        return Err(StoreError::InvalidKey(key.clone()));
    }

    Ok(())
}

/// Validates that a namespace is a plain lowercase table name (`[a-z0-9_]+`).
pub fn validate_namespace(namespace: &Namespace) -> Result<()> {
    let name = namespace.as_str();
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');

    if !valid {
        return Err(StoreError::InvalidNamespace(namespace.clone()));
    }

    Ok(())
}

/// Which storage backend to open at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Documents on the local filesystem.
    #[default]
    Fs,
    /// Process-local map; contents are lost on exit.
    Memory,
}

/// Opens the configured backend as a shared store handle.
///
/// Stores outside the crate plug in through [`SerializedStore`] and
/// [`AppState::with_store`](crate::server::AppState::with_store) instead.
pub fn open(backend: StoreBackend, data_dir: &Path) -> Result<Arc<dyn NotificationStore>> {
    let store: Arc<dyn NotificationStore> = match backend {
        StoreBackend::Fs => Arc::new(FsStore::open(data_dir)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
