//! Code generation errors

use rxmig_core::{ErrorCategory, FileIssue};

/// Errors while generating or splicing one method
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    /// Edit range lies outside the text
    #[error("edit {start}..{end} is out of bounds for {len} lines")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// Edit range intersects an earlier accepted edit
    #[error("edit {start}..{end} overlaps another edit")]
    Overlap { start: usize, end: usize },

    /// Recorded line range no longer matches the text
    #[error("stale range for '{method}': lines {start}-{end} no longer hold its source")]
    StaleRange {
        method: String,
        start: usize,
        end: usize,
    },

    /// Declaration shares its first or last line with other code
    #[error("'{method}' shares a line with other code: {detail}")]
    UnsupportedLayout { method: String, detail: String },

    /// Import block cannot be rewritten without touching other code
    #[error("import block not rewritten: {0}")]
    ImportLayout(String),

    /// Delimiters in the assembled text do not pair up
    #[error("unbalanced output: {0}")]
    Unbalanced(String),
}

impl CodegenError {
    /// Category of this error in the shared taxonomy
    #[inline]
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unbalanced(_) => ErrorCategory::Syntax,
            Self::ImportLayout(_) => ErrorCategory::Import,
            _ => ErrorCategory::PatternInvariant,
        }
    }

    /// As a result issue, optionally tied to a method
    #[must_use]
    pub fn to_issue(&self, method: Option<&str>) -> FileIssue {
        match method {
            Some(name) => FileIssue::for_method(self.category(), name, self.to_string()),
            None => FileIssue::new(self.category(), self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let stale = CodegenError::StaleRange {
            method: "load".into(),
            start: 3,
            end: 9,
        };
        assert_eq!(stale.category(), ErrorCategory::PatternInvariant);
        assert_eq!(stale.to_issue(Some("load")).method.as_deref(), Some("load"));
        let unbalanced = CodegenError::Unbalanced("line 4".into());
        assert_eq!(unbalanced.category(), ErrorCategory::Syntax);
        let layout = CodegenError::ImportLayout("shared line".into());
        assert_eq!(layout.category(), ErrorCategory::Import);
    }
}
