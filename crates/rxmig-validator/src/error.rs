//! Validator errors
//!
//! Most findings become [`rxmig_core::ValidationIssue`]s inside a report.
//! These are the failures of the checks themselves.

use rxmig_core::ErrorCategory;
use std::path::PathBuf;

/// Errors while running a check
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    /// IO error reading a file the check needs
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest exists but is not usable
    #[error("malformed manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// Checker command could not be started
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Checker ran but produced nothing it could be judged by
    #[error("'{command}' failed without diagnostics: {detail}")]
    CheckerFailed { command: String, detail: String },

    /// Checker is configured without a command
    #[error("type checker command is empty")]
    EmptyCommand,
}

impl ValidatorError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create manifest error for path
    pub fn manifest(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Category of this error in the shared taxonomy
    #[inline]
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. } => ErrorCategory::FileAccess,
            Self::Manifest { .. } => ErrorCategory::Dependency,
            Self::Spawn { .. } | Self::CheckerFailed { .. } | Self::EmptyCommand => {
                ErrorCategory::Configuration
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let io = ValidatorError::io_error(
            "a.ts",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(io.category(), ErrorCategory::FileAccess);
        assert!(io.to_string().contains("a.ts"));
        assert_eq!(
            ValidatorError::manifest("package.json", "trailing comma").category(),
            ErrorCategory::Dependency
        );
        assert_eq!(ValidatorError::EmptyCommand.category(), ErrorCategory::Configuration);
    }
}
