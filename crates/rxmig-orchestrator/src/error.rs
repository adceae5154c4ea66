//! Run-level errors
//!
//! Per-file problems never surface here; they are attached to the file's
//! `GenerationResult`. A `MigrationError` ends the run.

use rxmig_core::{ConfigError, ErrorCategory};
use std::path::PathBuf;

/// Errors that abort a migration run
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Configuration rejected before the run started
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Include or exclude pattern is not a usable glob
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Target files could not be enumerated
    #[error("cannot enumerate {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Converted text could not be written back
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report could not be rendered
    #[error("failed to render report: {0}")]
    Render(String),

    /// Report could not be persisted
    #[error("failed to write report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrationError {
    /// Create discovery error
    pub fn discovery(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Discovery {
            path: path.into(),
            source,
        }
    }

    /// Create write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Category of this error in the shared taxonomy
    #[inline]
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Pattern { .. } => ErrorCategory::Configuration,
            Self::Discovery { .. } | Self::Write { .. } | Self::Report { .. } => {
                ErrorCategory::FileAccess
            }
            Self::Render(_) => ErrorCategory::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let err = MigrationError::write(
            "a.store.ts",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        );
        assert_eq!(err.category(), ErrorCategory::FileAccess);
        assert!(err.to_string().contains("a.store.ts"));
        let pattern = MigrationError::Pattern {
            pattern: "[".into(),
            message: "unclosed class".into(),
        };
        assert_eq!(pattern.category(), ErrorCategory::Configuration);
    }
}
