//! Target discovery

use crate::error::MigrationError;
use crate::fs::FileSystem;
use regex::Regex;
use rxmig_core::MigrationConfig;
use std::path::{Path, PathBuf};

/// What a run migrates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationTarget {
    /// Every matching file under a directory
    Directory(PathBuf),
    /// Exactly these files, relative paths resolved against `root`
    Files {
        /// Project root
        root: PathBuf,
        /// Files
        files: Vec<PathBuf>,
    },
}

impl MigrationTarget {
    /// Walk `root`
    #[must_use]
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        Self::Directory(root.into())
    }

    /// Explicit file list under `root`
    #[must_use]
    pub fn files<I, P>(root: impl Into<PathBuf>, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::Files {
            root: root.into(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    /// Project root
    #[must_use]
    pub fn root(&self) -> &Path {
        match self {
            Self::Directory(root) | Self::Files { root, .. } => root,
        }
    }
}

/// Files a run will look at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    /// Files left after exclusion, in a stable order
    pub files: Vec<PathBuf>,
    /// Files found before exclusion
    pub found: usize,
    /// Files removed by exclusion patterns
    pub excluded: usize,
}

/// Compiled include and exclude patterns
#[derive(Debug, Clone)]
pub struct Discovery {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl Discovery {
    /// Compile patterns from configuration
    ///
    /// # Errors
    /// `MigrationError::Pattern` for a pattern that does not compile
    pub fn from_config(config: &MigrationConfig) -> Result<Self, MigrationError> {
        Ok(Self {
            include: compile(&config.include_patterns)?,
            exclude: compile(&config.exclude_patterns)?,
        })
    }

    /// File name matches an include pattern
    #[must_use]
    pub fn is_included(&self, path: &Path) -> bool {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        self.include.iter().any(|re| re.is_match(&name))
    }

    /// Path matches an exclusion pattern
    ///
    /// Each pattern is tried against the path relative to `root`, the full
    /// path, and the bare file name.
    #[must_use]
    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let candidates = [
            slashed(relative),
            slashed(path),
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        ];
        self.exclude
            .iter()
            .any(|re| candidates.iter().any(|c| re.is_match(c)))
    }

    /// Resolve `target` into the files to migrate
    ///
    /// # Errors
    /// `MigrationError::Discovery` when a directory cannot be walked
    pub async fn discover(
        &self,
        fs: &dyn FileSystem,
        target: &MigrationTarget,
    ) -> Result<Discovered, MigrationError> {
        let root = target.root();
        let candidates: Vec<PathBuf> = match target {
            MigrationTarget::Directory(dir) => fs
                .list_files(dir)
                .await
                .map_err(|e| MigrationError::discovery(dir, e))?
                .into_iter()
                .filter(|p| self.is_included(p))
                .collect(),
            MigrationTarget::Files { files, .. } => {
                let mut seen = Vec::with_capacity(files.len());
                for file in files {
                    let path = if file.is_absolute() { file.clone() } else { root.join(file) };
                    if !seen.contains(&path) {
                        seen.push(path);
                    }
                }
                seen
            }
        };

        let found = candidates.len();
        let files: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|p| !self.is_excluded(root, p))
            .collect();
        let excluded = found - files.len();
        tracing::info!(root = %root.display(), found, excluded, "discovered files");
        Ok(Discovered {
            files,
            found,
            excluded,
        })
    }
}

/// Translate a glob into an anchored regex
///
/// `**/` matches any number of directories, `**` anything, `*` anything but a
/// separator, `?` one non-separator character.
///
/// # Errors
/// `MigrationError::Pattern` if the resulting regex does not compile
pub fn glob_to_regex(glob: &str) -> Result<Regex, MigrationError> {
    let mut out = String::from("^");
    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push('$');
    Regex::new(&out).map_err(|e| MigrationError::Pattern {
        pattern: glob.to_string(),
        message: e.to_string(),
    })
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, MigrationError> {
    patterns.iter().map(|p| glob_to_regex(p)).collect()
}

fn slashed(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replace("//", "/")
}
