//! Low-level fsync operations for durable documents.
//!
//! A new document is only durable once both its contents and the directory
//! entry naming it have been synced. Creating a hard link updates the directory,
//! so [`fsync_dir`] must follow every successful link.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that entries created in it survive a power loss.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

/// Writes `bytes` to a file that must not already exist, then syncs it.
///
/// Fails with [`io::ErrorKind::AlreadyExists`] if `path` is taken, so two
/// writers can never share a temp file.
pub fn write_new_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    fsync_file(&file)
}
