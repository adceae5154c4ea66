//! Project manifest lookup
//!
//! Pre-validation asks a [`ManifestReader`] which packages the project
//! declares. [`PackageJsonReader`] walks up from the file to the nearest
//! `package.json`; [`StaticManifest`] answers from a fixed set.

use crate::error::ValidatorError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Packages converted code imports at runtime
pub const REQUIRED_DEPENDENCIES: [&str; 3] = ["@ngrx/signals", "rxjs", "@ngrx/operators"];

/// Manifest file name
pub const MANIFEST_NAME: &str = "package.json";

/// Source of declared dependencies
pub trait ManifestReader: Send + Sync + Debug {
    /// Nearest manifest governing `file`
    fn locate(&self, file: &Path) -> Option<PathBuf>;

    /// Every package the manifest declares, across all dependency tables
    ///
    /// # Errors
    /// If the manifest cannot be read or parsed
    fn dependencies(&self, manifest: &Path) -> Result<BTreeSet<String>, ValidatorError>;
}

/// Reads `package.json` files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonReader;

impl PackageJsonReader {
    /// Create reader
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, serde_json::Value>,
}

impl ManifestReader for PackageJsonReader {
    fn locate(&self, file: &Path) -> Option<PathBuf> {
        file.ancestors()
            .skip(1)
            .map(|dir| dir.join(MANIFEST_NAME))
            .find(|candidate| candidate.is_file())
    }

    fn dependencies(&self, manifest: &Path) -> Result<BTreeSet<String>, ValidatorError> {
        let text = std::fs::read_to_string(manifest)
            .map_err(|e| ValidatorError::io_error(manifest, e))?;
        let parsed: PackageJson =
            serde_json::from_str(&text).map_err(|e| ValidatorError::manifest(manifest, e))?;
        Ok(parsed
            .dependencies
            .into_keys()
            .chain(parsed.dev_dependencies.into_keys())
            .chain(parsed.peer_dependencies.into_keys())
            .collect())
    }
}

/// Fixed answer, for runs whose files do not live on disk
#[derive(Debug, Clone, Default)]
pub struct StaticManifest {
    declared: Option<BTreeSet<String>>,
}

impl StaticManifest {
    /// Manifest declaring `packages`
    #[must_use]
    pub fn declaring<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            declared: Some(packages.into_iter().map(Into::into).collect()),
        }
    }

    /// Manifest declaring every required package
    #[must_use]
    pub fn complete() -> Self {
        Self::declaring(REQUIRED_DEPENDENCIES)
    }

    /// No manifest at all
    #[must_use]
    pub fn absent() -> Self {
        Self { declared: None }
    }
}

impl ManifestReader for StaticManifest {
    fn locate(&self, _file: &Path) -> Option<PathBuf> {
        self.declared.as_ref().map(|_| PathBuf::from(MANIFEST_NAME))
    }

    fn dependencies(&self, _manifest: &Path) -> Result<BTreeSet<String>, ValidatorError> {
        Ok(self.declared.clone().unwrap_or_default())
    }
}

/// Required packages missing from `declared`, in declaration order
#[must_use]
pub fn missing_dependencies(declared: &BTreeSet<String>) -> Vec<&'static str> {
    REQUIRED_DEPENDENCIES
        .into_iter()
        .filter(|dep| !declared.contains(*dep))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxmig_test_utils::{TestProject, PACKAGE_JSON_MISSING_OPERATORS};

    #[test]
    fn nearest_manifest_wins() {
        let project = TestProject::with_manifest();
        project.write("libs/feature/package.json", PACKAGE_JSON_MISSING_OPERATORS);
        let nested = project.write("libs/feature/src/a.store.ts", "");
        let top = project.write("src/app/b.store.ts", "");

        let reader = PackageJsonReader::new();
        assert_eq!(
            reader.locate(&nested),
            Some(project.root().join("libs/feature/package.json"))
        );
        assert_eq!(reader.locate(&top), Some(project.root().join("package.json")));
    }

    #[test]
    fn all_tables_are_read() {
        let project = TestProject::new();
        let manifest = project.write("package.json", PACKAGE_JSON_MISSING_OPERATORS);
        let declared = PackageJsonReader::new().dependencies(&manifest).unwrap();
        assert!(declared.contains("rxjs"));
        assert_eq!(missing_dependencies(&declared), vec!["@ngrx/operators"]);
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let project = TestProject::new();
        let manifest = project.write("package.json", "{ \"dependencies\": ");
        let err = PackageJsonReader::new().dependencies(&manifest).unwrap_err();
        assert!(matches!(err, ValidatorError::Manifest { .. }));
    }

    #[test]
    fn static_manifest() {
        assert!(StaticManifest::absent().locate(Path::new("a.ts")).is_none());
        let complete = StaticManifest::complete();
        let declared = complete.dependencies(Path::new(MANIFEST_NAME)).unwrap();
        assert!(missing_dependencies(&declared).is_empty());
    }
}
