//! Error types shared across the workspace
//!
//! Provides:
//! - [`ErrorCategory`]: the taxonomy every per-file problem is filed under
//! - [`FileIssue`]: a problem caught at its origin and attached to a result
//! - [`ConfigError`]: configuration loading and validation failures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Taxonomy of problems the tool can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// File could not be read, written, copied or stat'ed
    FileAccess,
    /// Source text is structurally invalid
    Syntax,
    /// Project manifest lacks a required runtime dependency
    Dependency,
    /// Generated code violates a reactive-pipeline invariant
    PatternInvariant,
    /// Import table is malformed or conflicting
    Import,
    /// Run configuration is invalid
    Configuration,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::FileAccess => "file-access",
            ErrorCategory::Syntax => "syntax",
            ErrorCategory::Dependency => "dependency",
            ErrorCategory::PatternInvariant => "pattern-invariant",
            ErrorCategory::Import => "import",
            ErrorCategory::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// A problem attached to the record or result that owns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIssue {
    /// Category
    pub category: ErrorCategory,
    /// Human-readable message
    pub message: String,
    /// Method the issue belongs to, if method-scoped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl FileIssue {
    /// Create file-scoped issue
    #[inline]
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            method: None,
        }
    }

    /// Create method-scoped issue
    #[inline]
    #[must_use]
    pub fn for_method(
        category: ErrorCategory,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            method: Some(method.into()),
        }
    }
}

impl std::fmt::Display for FileIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.method {
            Some(method) => write!(f, "[{}] {}: {}", self.category, method, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

/// Errors while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during config read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unsupported config file extension
    #[error("unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    /// Config file did not deserialize
    #[error("invalid config in {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Option value out of range or inconsistent
    #[error("invalid option {option}: {reason}")]
    InvalidOption { option: &'static str, reason: String },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create malformed-config error for path
    pub fn malformed(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Malformed {
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
            _ => ErrorCategory::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_display_includes_method() {
        let issue = FileIssue::for_method(ErrorCategory::PatternInvariant, "loadAll", "no rxMethod");
        assert_eq!(issue.to_string(), "[pattern-invariant] loadAll: no rxMethod");
    }

    #[test]
    fn issue_display_file_scoped() {
        let issue = FileIssue::new(ErrorCategory::Syntax, "unbalanced braces");
        assert_eq!(issue.to_string(), "[syntax] unbalanced braces");
    }

    #[test]
    fn config_error_category() {
        let err = ConfigError::InvalidOption {
            option: "max_parallel_files",
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("max_parallel_files"));
    }
}
