//! File-system seam
//!
//! The migrator touches files only through [`FileSystem`]. [`TokioFs`] is the
//! real disk; [`MemoryFs`] keeps files in memory and can be told to fail
//! writes, which the rollback paths are tested with.

use dashmap::{DashMap, DashSet};
use rxmig_validator::FileProbe;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

/// File operations a migration needs
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync + Debug {
    /// Read a file as UTF-8
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's contents
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Copy `from` over `to`
    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Existence, kind, size and text of a path
    async fn probe(&self, path: &Path) -> FileProbe;

    /// Every regular file under `root`, recursively
    async fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The local disk, through `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

#[async_trait::async_trait]
impl FileSystem for TokioFs {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::copy(from, to).await.map(|_| ())
    }

    async fn probe(&self, path: &Path) -> FileProbe {
        FileProbe::read(path).await
    }

    async fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            for entry in walkdir::WalkDir::new(&root).follow_links(false) {
                let entry = entry.map_err(io::Error::from)?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            files.sort();
            Ok(files)
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// In-memory files
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: DashMap<PathBuf, String>,
    failing_writes: DashSet<PathBuf>,
}

impl MemoryFs {
    /// Create empty file system
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Make every write to `path` fail
    #[must_use]
    pub fn failing_writes_to(self, path: impl Into<PathBuf>) -> Self {
        self.failing_writes.insert(path.into());
        self
    }

    /// Current contents of a file
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.get(path).map(|c| c.value().clone())
    }

    /// Whether a file exists
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
    }
}

#[async_trait::async_trait]
impl FileSystem for MemoryFs {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.contents(path).ok_or_else(|| Self::not_found(path))
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if self.failing_writes.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            ));
        }
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let contents = self.contents(from).ok_or_else(|| Self::not_found(from))?;
        self.files.insert(to.to_path_buf(), contents);
        Ok(())
    }

    async fn probe(&self, path: &Path) -> FileProbe {
        if let Some(text) = self.contents(path) {
            return FileProbe::file(text);
        }
        let is_dir = self.files.iter().any(|e| e.key().starts_with(path));
        FileProbe {
            exists: is_dir,
            ..FileProbe::missing()
        }
    }

    async fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .files
            .iter()
            .map(|e| e.key().clone())
            .filter(|p| p.starts_with(root))
            .collect();
        if files.is_empty() && !self.exists(root) {
            return Err(Self::not_found(root));
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxmig_test_utils::TestProject;

    #[tokio::test]
    async fn memory_fs_round_trip() {
        let fs = MemoryFs::new().with_file("/p/a.ts", "a");
        fs.copy(Path::new("/p/a.ts"), Path::new("/p/a.ts.bak")).await.unwrap();
        fs.write(Path::new("/p/a.ts"), "b").await.unwrap();
        assert_eq!(fs.contents(Path::new("/p/a.ts.bak")).as_deref(), Some("a"));
        assert_eq!(fs.read_to_string(Path::new("/p/a.ts")).await.unwrap(), "b");
        assert_eq!(fs.list_files(Path::new("/p")).await.unwrap().len(), 2);

        let dir = fs.probe(Path::new("/p")).await;
        assert!(dir.exists && !dir.is_file);
        assert!(!fs.probe(Path::new("/q")).await.exists);
        assert!(fs.list_files(Path::new("/q")).await.is_err());
    }

    #[tokio::test]
    async fn memory_fs_write_failure() {
        let fs = MemoryFs::new()
            .with_file("/p/a.ts", "a")
            .failing_writes_to("/p/a.ts");
        let err = fs.write(Path::new("/p/a.ts"), "b").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(fs.contents(Path::new("/p/a.ts")).as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn tokio_fs_lists_recursively() {
        let project = TestProject::new();
        project.write("src/a.store.ts", "");
        project.write("src/nested/b.store.ts", "");
        let files = TokioFs.list_files(project.root()).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(TokioFs.list_files(&project.root().join("missing")).await.is_err());
    }
}
