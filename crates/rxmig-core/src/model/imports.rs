//! Import table model
//!
//! An [`ImportTable`] is keyed by module path; each module appears once.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One `name` or `name as alias` inside braces
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImportSpecifier {
    /// Exported name
    pub name: String,
    /// Local alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ImportSpecifier {
    /// Create plain specifier
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Create aliased specifier
    #[inline]
    #[must_use]
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Name bound in the importing file
    #[inline]
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl std::fmt::Display for ImportSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.name, alias),
            None => f.write_str(&self.name),
        }
    }
}

/// All imports from one module
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportEntry {
    /// Module path (natural key)
    pub module: String,
    /// Named imports
    #[serde(default)]
    pub named: BTreeSet<ImportSpecifier>,
    /// Default import binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_import: Option<String>,
    /// `* as ns` binding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// `import type { ... }`
    #[serde(default)]
    pub type_only: bool,
}

impl ImportEntry {
    /// Create entry with named imports
    #[must_use]
    pub fn named<I, S>(module: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module: module.into(),
            named: names.into_iter().map(ImportSpecifier::new).collect(),
            ..Self::default()
        }
    }

    /// Create side-effect-only entry (`import 'module';`)
    #[inline]
    #[must_use]
    pub fn side_effect(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// With default import
    #[inline]
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_import = Some(name.into());
        self
    }

    /// With namespace import
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, alias: impl Into<String>) -> Self {
        self.namespace = Some(alias.into());
        self
    }

    /// Whether the entry binds nothing
    #[inline]
    #[must_use]
    pub fn is_side_effect(&self) -> bool {
        self.named.is_empty() && self.default_import.is_none() && self.namespace.is_none()
    }

    /// Whether a named import with this exported name is present
    #[inline]
    #[must_use]
    pub fn has_named(&self, name: &str) -> bool {
        self.named.iter().any(|s| s.name == name)
    }

    /// Every local name this entry binds
    pub fn local_bindings(&self) -> impl Iterator<Item = &str> {
        self.default_import
            .as_deref()
            .into_iter()
            .chain(self.namespace.as_deref())
            .chain(self.named.iter().map(ImportSpecifier::local_name))
    }
}

/// Import table keyed by module path, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportTable {
    entries: IndexMap<String, ImportEntry>,
}

impl ImportTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for its module
    #[inline]
    pub fn insert(&mut self, entry: ImportEntry) -> Option<ImportEntry> {
        self.entries.insert(entry.module.clone(), entry)
    }

    /// Entry for module
    #[inline]
    #[must_use]
    pub fn get(&self, module: &str) -> Option<&ImportEntry> {
        self.entries.get(module)
    }

    /// Mutable entry for module
    #[inline]
    pub fn get_mut(&mut self, module: &str) -> Option<&mut ImportEntry> {
        self.entries.get_mut(module)
    }

    /// Whether the table has an entry for module
    #[inline]
    #[must_use]
    pub fn contains_module(&self, module: &str) -> bool {
        self.entries.contains_key(module)
    }

    /// Whether `name` is imported (as a named import) from `module`
    #[must_use]
    pub fn imports_name(&self, module: &str, name: &str) -> bool {
        self.get(module).is_some_and(|e| e.has_named(name))
    }

    /// Module a local binding resolves to
    #[must_use]
    pub fn module_for_binding(&self, local: &str) -> Option<&str> {
        self.entries
            .values()
            .find(|e| e.local_bindings().any(|b| b == local))
            .map(|e| e.module.as_str())
    }

    /// Iterate entries in table order
    pub fn iter(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.values()
    }

    /// Number of modules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ImportEntry> for ImportTable {
    fn from_iter<I: IntoIterator<Item = ImportEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specifier_local_name() {
        assert_eq!(ImportSpecifier::new("tap").local_name(), "tap");
        assert_eq!(ImportSpecifier::aliased("tap", "rxTap").local_name(), "rxTap");
        assert_eq!(ImportSpecifier::aliased("tap", "rxTap").to_string(), "tap as rxTap");
    }

    #[test]
    fn entry_bindings() {
        let entry = ImportEntry::named("rxjs", ["pipe", "tap"]).with_default("Rx");
        let bindings: Vec<_> = entry.local_bindings().collect();
        assert_eq!(bindings, vec!["Rx", "pipe", "tap"]);
        assert!(!entry.is_side_effect());
        assert!(ImportEntry::side_effect("zone.js").is_side_effect());
    }

    #[test]
    fn table_binding_lookup() {
        let table: ImportTable = [
            ImportEntry::named("rxjs", ["pipe"]),
            ImportEntry::named("@ngrx/signals", ["patchState"]),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.module_for_binding("patchState"), Some("@ngrx/signals"));
        assert!(table.imports_name("rxjs", "pipe"));
        assert!(!table.imports_name("rxjs", "tap"));
        assert_eq!(table.len(), 2);
    }
}
