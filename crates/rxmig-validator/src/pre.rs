//! Checks run before a file is converted

use crate::manifest::{missing_dependencies, ManifestReader, PackageJsonReader};
use rxmig_core::{ErrorCategory, MigrationConfig, ValidationReport};
use rxmig_scanner::scan_source;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Files above this size get a warning
pub const MAX_FILE_BYTES: u64 = 512 * 1024;

const EXTENSIONS: [&str; 2] = ["ts", "tsx"];

/// What the caller could learn about a file
///
/// Built by whoever owns the file system, so in-memory runs validate the same
/// way as on-disk ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileProbe {
    /// Path exists
    pub exists: bool,
    /// Path is a regular file
    pub is_file: bool,
    /// Size in bytes
    pub size: u64,
    /// Text, when it could be read as UTF-8
    pub text: Option<String>,
}

impl FileProbe {
    /// Probe of a missing path
    #[must_use]
    pub fn missing() -> Self {
        Self::default()
    }

    /// Probe of a readable regular file
    #[must_use]
    pub fn file(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            exists: true,
            is_file: true,
            size: text.len() as u64,
            text: Some(text),
        }
    }

    /// Probe a path on disk
    pub async fn read(path: &Path) -> Self {
        let Ok(metadata) = tokio::fs::metadata(path).await else {
            return Self::missing();
        };
        let text = if metadata.is_file() {
            tokio::fs::read_to_string(path).await.ok()
        } else {
            None
        };
        Self {
            exists: true,
            is_file: metadata.is_file(),
            size: metadata.len(),
            text,
        }
    }
}

/// Pre-conversion validator
#[derive(Debug, Clone)]
pub struct PreValidator {
    file_suffix: String,
    manifest: Arc<dyn ManifestReader>,
}

impl PreValidator {
    /// Create validator expecting `file_suffix`, reading `package.json` from disk
    #[must_use]
    pub fn new(file_suffix: impl Into<String>) -> Self {
        Self {
            file_suffix: file_suffix.into(),
            manifest: Arc::new(PackageJsonReader::new()),
        }
    }

    /// Create validator from run configuration
    #[must_use]
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(config.file_suffix.clone())
    }

    /// Set manifest source
    #[must_use]
    pub fn with_manifest(mut self, manifest: Arc<dyn ManifestReader>) -> Self {
        self.manifest = manifest;
        self
    }

    /// Probe `path` on disk and validate it
    pub async fn validate(&self, path: &Path) -> ValidationReport {
        let probe = FileProbe::read(path).await;
        self.validate_probe(path, &probe)
    }

    /// Validate an already probed file
    #[must_use]
    pub fn validate_probe(&self, path: &Path, probe: &FileProbe) -> ValidationReport {
        let started = Instant::now();
        let mut report = ValidationReport::new();

        if !probe.exists {
            report.error(ErrorCategory::FileAccess, "file does not exist");
            return report.finish(started);
        }
        if !probe.is_file {
            report.error(ErrorCategory::FileAccess, "not a regular file");
            return report.finish(started);
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if !EXTENSIONS.contains(&extension) {
            report.error(
                ErrorCategory::Configuration,
                format!("unsupported extension '.{extension}', expected .ts or .tsx"),
            );
            return report.finish(started);
        }
        if !self.file_suffix.is_empty() && !name.ends_with(&self.file_suffix) {
            report.warning(
                ErrorCategory::Configuration,
                format!("'{name}' does not follow the '{}' naming convention", self.file_suffix),
            );
        }
        if probe.size > MAX_FILE_BYTES {
            report.warning(
                ErrorCategory::FileAccess,
                format!("file is {} KiB, larger than {} KiB", probe.size / 1024, MAX_FILE_BYTES / 1024),
            );
        }

        let Some(text) = probe.text.as_deref() else {
            report.error(ErrorCategory::FileAccess, "file is not readable as UTF-8 text");
            return report.finish(started);
        };

        match scan_source(path, text) {
            Ok(scanned) if scanned.is_empty() => {
                report.warning(ErrorCategory::PatternInvariant, "no async methods to convert");
            }
            Ok(scanned) => {
                report.note(format!("{} candidate method(s)", scanned.methods.len()));
            }
            Err(e) => report.error_at(e.category(), e.to_string(), e.line()),
        }

        self.check_dependencies(path, &mut report);
        tracing::debug!(
            path = %path.display(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "pre-validated"
        );
        report.finish(started)
    }

    fn check_dependencies(&self, path: &Path, report: &mut ValidationReport) {
        let Some(manifest) = self.manifest.locate(path) else {
            report.warning(
                ErrorCategory::Dependency,
                "no package.json found; runtime dependencies not checked",
            );
            return;
        };
        match self.manifest.dependencies(&manifest) {
            Ok(declared) => {
                for dep in missing_dependencies(&declared) {
                    report.error(
                        ErrorCategory::Dependency,
                        format!("'{dep}' is not declared in {}", manifest.display()),
                    );
                }
            }
            Err(e) => report.error(e.category(), e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::StaticManifest;
    use rxmig_test_utils::{NO_CANDIDATES_STORE, SIMPLE_LOAD_STORE, UNBALANCED_STORE};

    fn validator(manifest: StaticManifest) -> PreValidator {
        PreValidator::new(".store.ts").with_manifest(Arc::new(manifest))
    }

    #[test]
    fn clean_store_passes() {
        let report = validator(StaticManifest::complete())
            .validate_probe(Path::new("projects.store.ts"), &FileProbe::file(SIMPLE_LOAD_STORE));
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty());
        assert_eq!(report.info, vec!["1 candidate method(s)".to_string()]);
    }

    #[test]
    fn missing_file_stops_early() {
        let report =
            validator(StaticManifest::complete()).validate_probe(Path::new("a.store.ts"), &FileProbe::missing());
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].category, ErrorCategory::FileAccess);
    }

    #[test]
    fn unbalanced_braces_are_syntax_errors() {
        let report = validator(StaticManifest::complete())
            .validate_probe(Path::new("broken.store.ts"), &FileProbe::file(UNBALANCED_STORE));
        assert!(!report.is_valid);
        assert_eq!(report.errors[0].category, ErrorCategory::Syntax);
        assert!(report.errors[0].line.is_some());
    }

    #[test]
    fn naming_and_census_warnings_do_not_block() {
        let report = validator(StaticManifest::complete())
            .validate_probe(Path::new("state.ts"), &FileProbe::file(NO_CANDIDATES_STORE));
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let report = validator(StaticManifest::complete())
            .validate_probe(Path::new("store.js"), &FileProbe::file("export {};"));
        assert!(!report.is_valid);
        assert_eq!(report.errors[0].category, ErrorCategory::Configuration);
    }

    #[test]
    fn oversize_files_warn() {
        let mut probe = FileProbe::file(SIMPLE_LOAD_STORE);
        probe.size = MAX_FILE_BYTES + 1;
        let report = validator(StaticManifest::complete()).validate_probe(Path::new("a.store.ts"), &probe);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.message.contains("KiB")));
    }

    #[test]
    fn dependencies() {
        let path = Path::new("a.store.ts");
        let probe = FileProbe::file(SIMPLE_LOAD_STORE);

        let partial = validator(StaticManifest::declaring(["rxjs"])).validate_probe(path, &probe);
        let missing: Vec<_> = partial
            .errors
            .iter()
            .filter(|e| e.category == ErrorCategory::Dependency)
            .collect();
        assert_eq!(missing.len(), 2);

        let absent = validator(StaticManifest::absent()).validate_probe(path, &probe);
        assert!(absent.is_valid);
        assert_eq!(absent.warnings[0].category, ErrorCategory::Dependency);
    }
}
