//! Per-method and per-file results

use super::imports::ImportEntry;
use super::method::PatternLabel;
use crate::error::{ErrorCategory, FileIssue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// A non-winning label worth considering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    /// Label
    pub label: PatternLabel,
    /// Confidence (0-100)
    pub confidence: u8,
    /// Why the rule scored as it did
    pub reason: String,
}

/// Classifier verdict for one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Recommended label
    pub label: PatternLabel,
    /// Confidence of the recommendation (0-100)
    pub confidence: u8,
    /// Ranked alternatives, highest first
    pub alternatives: Vec<Alternative>,
    /// Warnings from all rules
    pub warnings: Vec<String>,
    /// Whether a human should look at the output
    pub requires_manual_review: bool,
}

/// Generated replacement for one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Original method name
    pub method_name: String,
    /// Pattern used
    pub pattern: PatternLabel,
    /// Generated reactive-pipeline method text
    pub body: String,
    /// Generated compatibility wrapper text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    /// Imports the generated text needs
    pub required_imports: Vec<ImportEntry>,
    /// Classifier confidence
    pub confidence: u8,
}

/// Name bound to two modules and how it was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConflict {
    /// Local name that collided
    pub name: String,
    /// Module that keeps the plain name
    pub kept_module: String,
    /// Module whose import was renamed
    pub renamed_module: String,
    /// New local alias
    pub alias: String,
    /// Resolution note
    pub note: String,
}

/// What import reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportChangeSummary {
    /// Modules newly added
    pub added: Vec<String>,
    /// Existing modules that gained bindings
    pub modified: Vec<String>,
    /// Collisions resolved by renaming
    pub conflicts: Vec<ImportConflict>,
}

impl ImportChangeSummary {
    /// Whether nothing changed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.conflicts.is_empty()
    }
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Category
    pub category: ErrorCategory,
    /// Message
    pub message: String,
    /// 1-based line, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.category, line, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

/// Uniform result of every validation checkpoint
///
/// Errors block; warnings never block; info is descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// No errors recorded
    pub is_valid: bool,
    /// Blocking findings
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking findings
    pub warnings: Vec<ValidationIssue>,
    /// Descriptive notes
    pub info: Vec<String>,
    /// Time spent
    pub duration: Duration,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// Create empty (valid) report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            info: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Record error
    pub fn error(&mut self, category: ErrorCategory, message: impl Into<String>) {
        self.error_at(category, message, None);
    }

    /// Record error at line
    pub fn error_at(
        &mut self,
        category: ErrorCategory,
        message: impl Into<String>,
        line: Option<usize>,
    ) {
        self.errors.push(ValidationIssue {
            category,
            message: message.into(),
            line,
        });
        self.is_valid = false;
    }

    /// Record warning
    pub fn warning(&mut self, category: ErrorCategory, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            category,
            message: message.into(),
            line: None,
        });
    }

    /// Record info note
    pub fn note(&mut self, message: impl Into<String>) {
        self.info.push(message.into());
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: ValidationReport) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
        self.duration += other.duration;
    }

    /// Stamp duration measured from `started`
    #[must_use]
    pub fn finish(mut self, started: Instant) -> Self {
        self.duration = started.elapsed();
        self.is_valid = self.errors.is_empty();
        self
    }

    /// Errors as file issues
    #[must_use]
    pub fn error_issues(&self) -> Vec<FileIssue> {
        self.errors
            .iter()
            .map(|e| FileIssue::new(e.category, e.to_string()))
            .collect()
    }
}

/// Outcome of converting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// File path
    pub path: PathBuf,
    /// No blocking error was recorded
    pub success: bool,
    /// Text before conversion
    pub original_code: String,
    /// Text after conversion (equal to original when nothing converted)
    pub converted_code: String,
    /// Methods replaced
    pub converted_count: usize,
    /// Methods left untouched
    pub skipped_count: usize,
    /// Blocking problems
    pub errors: Vec<FileIssue>,
    /// Non-blocking problems
    pub warnings: Vec<String>,
    /// Import reconciliation summary
    pub import_changes: ImportChangeSummary,
    /// Validation outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    /// Per-method conversions
    pub conversions: Vec<ConversionRecord>,
    /// Methods flagged for manual review
    pub manual_review: Vec<String>,
}

impl GenerationResult {
    /// Create result with no changes
    #[must_use]
    pub fn unchanged(path: impl Into<PathBuf>, original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            path: path.into(),
            success: true,
            converted_code: original.clone(),
            original_code: original,
            converted_count: 0,
            skipped_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            import_changes: ImportChangeSummary::default(),
            validation: None,
            conversions: Vec::new(),
            manual_review: Vec::new(),
        }
    }

    /// Create failed result carrying one issue
    #[must_use]
    pub fn failed(path: impl Into<PathBuf>, original: impl Into<String>, issue: FileIssue) -> Self {
        let mut result = Self::unchanged(path, original);
        result.errors.push(issue);
        result.success = false;
        result
    }

    /// Whether the transformed text differs from the original
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.converted_code != self.original_code
    }

    /// Attach validation and recompute success
    pub fn attach_validation(&mut self, report: ValidationReport) {
        match &mut self.validation {
            Some(existing) => existing.merge(report),
            None => self.validation = Some(report),
        }
        self.refresh_success();
    }

    /// Recompute success from errors and validation
    pub fn refresh_success(&mut self) {
        self.success =
            self.errors.is_empty() && self.validation.as_ref().map_or(true, |v| v.is_valid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_becomes_invalid_on_error() {
        let mut report = ValidationReport::new();
        report.warning(ErrorCategory::Import, "unused import");
        assert!(report.is_valid);
        report.error(ErrorCategory::Syntax, "missing brace");
        assert!(!report.is_valid);
        assert_eq!(report.error_issues().len(), 1);
    }

    #[test]
    fn merge_keeps_invalidity() {
        let mut a = ValidationReport::new();
        let mut b = ValidationReport::new();
        b.error(ErrorCategory::Dependency, "rxjs missing");
        a.merge(b);
        assert!(!a.is_valid);
        assert_eq!(a.errors.len(), 1);
    }

    #[test]
    fn unchanged_result_is_identity() {
        let result = GenerationResult::unchanged("a.store.ts", "const x = 1;\n");
        assert!(result.success);
        assert!(!result.is_modified());
    }

    #[test]
    fn validation_drives_success() {
        let mut result = GenerationResult::unchanged("a.store.ts", "");
        let mut report = ValidationReport::new();
        report.error(ErrorCategory::PatternInvariant, "missing rxMethod");
        result.attach_validation(report);
        assert!(!result.success);
    }
}
