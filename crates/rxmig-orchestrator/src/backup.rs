//! Sibling-file backups and file-scoped restore

use crate::fs::FileSystem;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// One verified backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// File that was copied
    pub original: PathBuf,
    /// Where the copy lives
    pub backup: PathBuf,
    /// blake3 of the copied contents
    pub checksum: String,
}

/// Backups taken during a run, keyed by original path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupMap {
    entries: IndexMap<PathBuf, BackupEntry>,
}

impl BackupMap {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed backup
    pub fn record(&mut self, entry: BackupEntry) {
        self.entries.insert(entry.original.clone(), entry);
    }

    /// Backup of `original`
    #[must_use]
    pub fn get(&self, original: &Path) -> Option<&BackupEntry> {
        self.entries.get(original)
    }

    /// All backups, in the order they completed
    pub fn iter(&self) -> impl Iterator<Item = &BackupEntry> {
        self.entries.values()
    }

    /// Number of backups
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no backup was taken
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sibling backup path: `<file><suffix>`
#[must_use]
pub fn backup_path(original: &Path, suffix: &str) -> PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy `original` next to itself and check the copy
///
/// # Errors
/// If the file cannot be read or copied, or the copy differs
pub async fn create_backup(
    fs: &dyn FileSystem,
    original: &Path,
    suffix: &str,
) -> io::Result<BackupEntry> {
    let backup = backup_path(original, suffix);
    let before = blake3::hash(fs.read_to_string(original).await?.as_bytes());
    fs.copy(original, &backup).await?;
    let after = blake3::hash(fs.read_to_string(&backup).await?.as_bytes());
    if before != after {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("backup {} does not match its original", backup.display()),
        ));
    }
    Ok(BackupEntry {
        original: original.to_path_buf(),
        backup,
        checksum: after.to_hex().to_string(),
    })
}

/// Back up `files` concurrently
///
/// Returns the outcome per file, in input order.
pub async fn create_backups(
    fs: &dyn FileSystem,
    files: &[PathBuf],
    suffix: &str,
) -> Vec<(PathBuf, io::Result<BackupEntry>)> {
    let copies = files.iter().map(|path| async move {
        let outcome = create_backup(fs, path, suffix).await;
        (path.clone(), outcome)
    });
    join_all(copies).await
}

/// Put a backup's contents back over its original
///
/// # Errors
/// If the copy fails
pub async fn restore(fs: &dyn FileSystem, entry: &BackupEntry) -> io::Result<()> {
    fs.copy(&entry.backup, &entry.original).await?;
    tracing::info!(path = %entry.original.display(), "restored from backup");
    Ok(())
}
