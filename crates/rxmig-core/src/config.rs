//! Run configuration
//!
//! [`MigrationConfig`] carries every recognised option. It deserializes from
//! TOML, JSON or YAML; missing fields take their defaults.

use crate::error::ConfigError;
use crate::model::PatternLabel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output format of the persisted report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    /// Sectioned plain text
    #[default]
    StructuredText,
    /// Pretty-printed JSON
    Json,
    /// HTML rendered from Markdown
    RenderedDocument,
}

impl ReportFormat {
    /// File extension for persisted reports
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::StructuredText => "txt",
            ReportFormat::Json => "json",
            ReportFormat::RenderedDocument => "html",
        }
    }
}

/// Classifier thresholds
///
/// The per-rule strong-match values differ with no shared rationale; they are
/// kept as independent knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this the winner is flagged for manual review
    pub manual_review: u8,
    /// Non-winning rules above this become alternatives
    pub alternative: u8,
    /// Strong-match score for simple-load
    pub simple_load: u8,
    /// Strong-match score for optimistic-update
    pub optimistic_update: u8,
    /// Strong-match score for bulk-operation
    pub bulk_operation: u8,
    /// Lowest score custom-fallback can return
    pub custom_floor: u8,
}

impl Thresholds {
    /// Manual review threshold
    pub const MANUAL_REVIEW: u8 = 60;
    /// Alternative threshold
    pub const ALTERNATIVE: u8 = 30;
    /// Simple-load strong match
    pub const SIMPLE_LOAD: u8 = 70;
    /// Optimistic-update strong match
    pub const OPTIMISTIC_UPDATE: u8 = 80;
    /// Bulk-operation strong match
    pub const BULK_OPERATION: u8 = 65;
    /// Custom-fallback floor
    pub const CUSTOM_FLOOR: u8 = 20;

    /// Strong-match score for a label (custom-fallback has none)
    #[inline]
    #[must_use]
    pub fn strong_match(&self, label: PatternLabel) -> Option<u8> {
        match label {
            PatternLabel::SimpleLoad => Some(self.simple_load),
            PatternLabel::OptimisticUpdate => Some(self.optimistic_update),
            PatternLabel::BulkOperation => Some(self.bulk_operation),
            PatternLabel::CustomFallback => None,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            manual_review: Self::MANUAL_REVIEW,
            alternative: Self::ALTERNATIVE,
            simple_load: Self::SIMPLE_LOAD,
            optimistic_update: Self::OPTIMISTIC_UPDATE,
            bulk_operation: Self::BULK_OPERATION,
            custom_floor: Self::CUSTOM_FLOOR,
        }
    }
}

/// Full-program type check settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeCheckConfig {
    /// Run the checker after conversion
    pub enabled: bool,
    /// Budget before the check is abandoned
    pub timeout_secs: u64,
    /// Directory holding `tsconfig.json` (defaults to the run root)
    pub project_dir: Option<PathBuf>,
    /// Checker command and arguments
    pub command: Vec<String>,
}

impl Default for TypeCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 120,
            project_dir: None,
            command: vec!["npx".to_string(), "tsc".to_string(), "--noEmit".to_string()],
        }
    }
}

/// Migration run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Compute everything, write nothing
    pub preview_only: bool,
    /// Debug-level logging
    pub verbose_logging: bool,
    /// Copy each target to a sibling backup before mutation
    pub create_backups: bool,
    /// Emit `<name>Async` compatibility wrappers
    pub preserve_caller_compatibility: bool,
    /// Batch width for concurrent file I/O
    pub max_parallel_files: usize,
    /// Halt conversion after the first failing batch
    pub stop_on_first_error: bool,
    /// Persisted report format
    pub report_format: ReportFormat,
    /// Where to persist the report
    pub report_output_path: Option<PathBuf>,
    /// File name patterns searched for when discovering recursively
    pub include_patterns: Vec<String>,
    /// Glob patterns removed from the discovered set
    pub exclude_patterns: Vec<String>,
    /// File naming convention checked before conversion
    pub file_suffix: String,
    /// Suffix appended to backup file names
    pub backup_suffix: String,
    /// Prefix generated methods with a provenance comment
    pub add_provenance_comments: bool,
    /// Sort imports alphabetically within groups
    pub sort_imports: bool,
    /// Module exporting `optimisticUpdate` and `bulkOperation`
    pub helper_module: String,
    /// Module prefixes grouped first when rendering imports
    pub platform_prefixes: Vec<String>,
    /// Full-program check
    pub type_check: TypeCheckConfig,
    /// Classifier thresholds
    pub thresholds: Thresholds,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            preview_only: false,
            verbose_logging: false,
            create_backups: true,
            preserve_caller_compatibility: true,
            max_parallel_files: 8,
            stop_on_first_error: false,
            report_format: ReportFormat::StructuredText,
            report_output_path: None,
            include_patterns: vec!["*.store.ts".to_string()],
            exclude_patterns: vec!["**/node_modules/**".to_string(), "*.spec.ts".to_string()],
            file_suffix: ".store.ts".to_string(),
            backup_suffix: ".rxmig.bak".to_string(),
            add_provenance_comments: true,
            sort_imports: true,
            helper_module: "@app/shared/rx-helpers".to_string(),
            platform_prefixes: vec!["@angular/".to_string()],
            type_check: TypeCheckConfig::default(),
            thresholds: Thresholds::default(),
        }
    }
}

impl MigrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a `.toml`, `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::UnsupportedFormat` for other extensions
    /// - `ConfigError::Malformed` if deserialization fails
    /// - `ConfigError::InvalidOption` if [`validate`](Self::validate) fails
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&text).map_err(|e| ConfigError::malformed(path, e))?,
            "json" => serde_json::from_str(&text).map_err(|e| ConfigError::malformed(path, e))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&text).map_err(|e| ConfigError::malformed(path, e))?
            }
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check option ranges and consistency
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidOption` naming the first bad option
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel_files == 0 {
            return Err(ConfigError::InvalidOption {
                option: "max_parallel_files",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.create_backups && self.backup_suffix.trim().is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "backup_suffix",
                reason: "must not be empty when backups are enabled".to_string(),
            });
        }
        if self.helper_module.trim().is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "helper_module",
                reason: "must not be empty".to_string(),
            });
        }
        let t = &self.thresholds;
        for (option, value) in [
            ("thresholds.manual_review", t.manual_review),
            ("thresholds.alternative", t.alternative),
            ("thresholds.simple_load", t.simple_load),
            ("thresholds.optimistic_update", t.optimistic_update),
            ("thresholds.bulk_operation", t.bulk_operation),
            ("thresholds.custom_floor", t.custom_floor),
        ] {
            if value > 100 {
                return Err(ConfigError::InvalidOption {
                    option,
                    reason: format!("{value} is outside 0-100"),
                });
            }
        }
        if self.type_check.enabled && self.type_check.command.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "type_check.command",
                reason: "must name a program when type checking is enabled".to_string(),
            });
        }
        Ok(())
    }

    /// With preview mode
    #[inline]
    #[must_use]
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview_only = preview;
        self
    }

    /// With backups enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_backups(mut self, enabled: bool) -> Self {
        self.create_backups = enabled;
        self
    }

    /// With batch width
    #[inline]
    #[must_use]
    pub fn with_max_parallel_files(mut self, max: usize) -> Self {
        self.max_parallel_files = max;
        self
    }

    /// With compatibility wrappers enabled or disabled
    #[inline]
    #[must_use]
    pub fn with_compatibility(mut self, preserve: bool) -> Self {
        self.preserve_caller_compatibility = preserve;
        self
    }

    /// With stop-on-first-error
    #[inline]
    #[must_use]
    pub fn with_stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }

    /// With persisted report
    #[inline]
    #[must_use]
    pub fn with_report(mut self, format: ReportFormat, path: impl Into<PathBuf>) -> Self {
        self.report_format = format;
        self.report_output_path = Some(path.into());
        self
    }

    /// With exclusion patterns
    #[inline]
    #[must_use]
    pub fn with_exclusions<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// With include patterns
    #[inline]
    #[must_use]
    pub fn with_includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }
}
