//! Filesystem notification store.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   mpesa_stk_push_callback/
//!     837-18118467-1.json
//!     .4242.7.tmp                    (only while an insert is in progress)
//!   mpesa_stk_push_callback_test/
//!     ...
//! ```
//!
//! An insert writes the full document to a temp file unique to this call,
//! fsyncs it, then hard links it to `<key>.json`. Linking fails if the target
//! exists, which makes the link the conditional create: exactly one writer
//! wins, and the target only ever names a complete document. Temp names are
//! `.<pid>.<counter>.tmp`, independent of the key, and start with a dot, which
//! [`validate_key`](super::validate_key) forbids for keys.
//!
//! Once the link exists the document is visible to every later insert, so an
//! insert that linked is reported `Created` even if the final directory fsync
//! fails. That failure is logged at `error!`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::fsync::{fsync_dir, write_new_synced};
use super::{
    InsertOutcome, NotificationStore, Result, StoreError, StoredNotification, validate_key,
    validate_namespace,
};
use crate::types::{Namespace, NaturalKey};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One JSON document per key, one directory per namespace.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// Temp files left behind by a crash mid-insert are removed. They never
    /// name a stored document, so removing them cannot lose a notification.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let removed = sweep_temp_files(&root)?;
        if removed > 0 {
            warn!(root = %root.display(), removed, "Removed temp files from interrupted inserts");
        }

        Ok(FsStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the document for `(namespace, key)` lives.
    pub fn document_path(&self, namespace: &Namespace, key: &NaturalKey) -> PathBuf {
        document_path(&self.root, namespace, key)
    }
}

#[async_trait]
impl NotificationStore for FsStore {
    async fn try_insert(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
        doc: StoredNotification,
    ) -> Result<InsertOutcome> {
        validate_namespace(namespace)?;
        validate_key(key)?;

        let bytes = serde_json::to_vec_pretty(&doc)?;
        let root = self.root.clone();
        let namespace = namespace.clone();
        let key = key.clone();

        tokio::task::spawn_blocking(move || insert_blocking(&root, &namespace, &key, &bytes))
            .await
            .map_err(|e| StoreError::Unavailable(format!("insert task failed: {e}")))?
    }

    async fn get(
        &self,
        namespace: &Namespace,
        key: &NaturalKey,
    ) -> Result<Option<StoredNotification>> {
        validate_namespace(namespace)?;
        validate_key(key)?;

        let path = self.document_path(namespace, key);

        tokio::task::spawn_blocking(move || read_blocking(&path))
            .await
            .map_err(|e| StoreError::Unavailable(format!("read task failed: {e}")))?
    }
}

fn document_path(root: &Path, namespace: &Namespace, key: &NaturalKey) -> PathBuf {
    root.join(namespace.as_str())
        .join(format!("{}.json", key.as_str()))
}

fn temp_path(dir: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".{}.{}.tmp", std::process::id(), n))
}

fn ensure_namespace_dir(root: &Path, namespace: &Namespace) -> io::Result<PathBuf> {
    let dir = root.join(namespace.as_str());
    if !dir.is_dir() {
        match std::fs::create_dir(&dir) {
            Ok(()) => fsync_dir(root)?,
            // Another insert created it first.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }
    Ok(dir)
}

fn insert_blocking(
    root: &Path,
    namespace: &Namespace,
    key: &NaturalKey,
    bytes: &[u8],
) -> Result<InsertOutcome> {
    let dir = ensure_namespace_dir(root, namespace)?;
    let final_path = dir.join(format!("{}.json", key.as_str()));

    // Fast path for redeliveries. The link below is still the authority.
    if final_path.exists() {
        return Ok(InsertOutcome::Duplicate);
    }

    let temp = temp_path(&dir);
    if let Err(e) = write_new_synced(&temp, bytes) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }

    link_into_place(&temp, &final_path, &dir, fsync_dir)
}

/// Links `temp` to `final_path` and removes `temp`.
///
/// The link decides the outcome. `sync_dir` runs only after a successful link
/// and its failure is logged, not returned.
fn link_into_place(
    temp: &Path,
    final_path: &Path,
    dir: &Path,
    sync_dir: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<InsertOutcome> {
    let linked = std::fs::hard_link(temp, final_path);
    let _ = std::fs::remove_file(temp);

    match linked {
        Ok(()) => {
            if let Err(e) = sync_dir(dir) {
                error!(
                    path = %final_path.display(),
                    error = %e,
                    "Stored notification but directory fsync failed"
                );
            }
            debug!(path = %final_path.display(), "Stored notification");
            Ok(InsertOutcome::Created)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(InsertOutcome::Duplicate),
        Err(e) => Err(e.into()),
    }
}

fn read_blocking(path: &Path) -> Result<Option<StoredNotification>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Removes `.*.tmp` files from every namespace directory under `root`.
fn sweep_temp_files(root: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(entry.path())? {
            let file = file?;
            let name = file.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') && name.ends_with(".tmp") {
                std::fs::remove_file(file.path())?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}
