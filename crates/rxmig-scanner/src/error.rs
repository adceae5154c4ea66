//! Scanner errors

use rxmig_core::ErrorCategory;
use std::path::PathBuf;

/// Errors while scanning a file
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// File extension has no grammar
    #[error("unsupported extension: '{0}'")]
    UnsupportedExtension(String),

    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Grammar could not be loaded
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Parser produced no tree
    #[error("parse failed")]
    ParseFailed,

    /// Source contains syntax errors
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

impl ScanError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create syntax error
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Category of this error in the shared taxonomy
    #[inline]
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. } | Self::UnsupportedExtension(_) => ErrorCategory::FileAccess,
            Self::ParserInit(_) | Self::ParseFailed | Self::Syntax { .. } => ErrorCategory::Syntax,
        }
    }

    /// 1-based line of a syntax error
    #[inline]
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err = ScanError::syntax(3, 7, "unexpected '}'");
        assert_eq!(err.to_string(), "syntax error at 3:7: unexpected '}'");
        assert_eq!(err.category(), ErrorCategory::Syntax);
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn extension_error_is_file_access() {
        let err = ScanError::UnsupportedExtension("py".to_string());
        assert_eq!(err.category(), ErrorCategory::FileAccess);
    }
}
