//! Import Reconciler
//!
//! Merges the imports generated code needs into a file's existing import
//! table and renders the result back to statements.
//!
//! # Merge rules
//!
//! - Key: module path; one entry per module
//! - Named imports are unioned
//! - Default and namespace bindings are kept from either side, existing wins;
//!   a required one whose name is already bound is left out, with a conflict
//! - `type_only` survives only if both sides are type-only
//! - A local name bound to two modules keeps the first binding; the later one
//!   is renamed `name as name_<sanitized module>`
//!
//! Reconciling a table with imports it already contains changes nothing.

use rxmig_core::{ImportConflict, ImportEntry, ImportSpecifier, ImportTable};
use std::collections::HashMap;

/// Result of merging required imports into a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Merged table
    pub merged: ImportTable,
    /// Modules that were not imported before
    pub added: Vec<String>,
    /// Existing modules that gained bindings or lost `type_only`
    pub modified: Vec<String>,
    /// Name collisions and how they were resolved
    pub conflicts: Vec<ImportConflict>,
    /// One warning per conflict
    pub warnings: Vec<String>,
}

impl ReconcileOutcome {
    /// Whether the merged table differs from the input
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.modified.is_empty()
    }

    /// Local name a required import from `module` ended up bound as
    #[must_use]
    pub fn binding_for(&self, module: &str, name: &str) -> String {
        self.merged
            .get(module)
            .and_then(|e| e.named.iter().find(|s| s.name == name))
            .map_or_else(|| name.to_string(), |s| s.local_name().to_string())
    }
}

/// Merge `required` into `existing`
#[must_use]
pub fn reconcile(existing: &ImportTable, required: &[ImportEntry]) -> ReconcileOutcome {
    let mut merged = existing.clone();
    let mut bindings: HashMap<String, String> = HashMap::new();
    for entry in existing.iter() {
        for local in entry.local_bindings() {
            bindings
                .entry(local.to_string())
                .or_insert_with(|| entry.module.clone());
        }
    }

    let mut outcome = ReconcileOutcome::default();
    for wanted in required {
        let module = wanted.module.as_str();
        let is_new = !merged.contains_module(module);
        let mut entry = merged.get(module).cloned().unwrap_or_else(|| ImportEntry {
            module: module.to_string(),
            type_only: wanted.type_only,
            ..ImportEntry::default()
        });
        let before = entry.clone();

        for spec in &wanted.named {
            if entry.has_named(&spec.name) {
                continue;
            }
            let local = spec.local_name();
            match bindings.get(local) {
                Some(owner) if owner != module => {
                    let alias = format!("{local}_{}", sanitize(module));
                    outcome.warnings.push(format!(
                        "'{local}' is already imported from '{owner}'; '{}' from '{module}' is imported as '{alias}'",
                        spec.name
                    ));
                    outcome.conflicts.push(ImportConflict {
                        name: local.to_string(),
                        kept_module: owner.clone(),
                        renamed_module: module.to_string(),
                        alias: alias.clone(),
                        note: format!("renamed to '{alias}'"),
                    });
                    bindings.insert(alias.clone(), module.to_string());
                    entry
                        .named
                        .insert(ImportSpecifier::aliased(spec.name.clone(), alias));
                }
                _ => {
                    bindings.insert(local.to_string(), module.to_string());
                    entry.named.insert(spec.clone());
                }
            }
        }

        if entry.default_import.is_none() {
            if let Some(default) = &wanted.default_import {
                match bindings.get(default) {
                    Some(owner) => skip_binding(&mut outcome, "default", default, owner, module),
                    None => {
                        bindings.insert(default.clone(), module.to_string());
                        entry.default_import = Some(default.clone());
                    }
                }
            }
        }
        if entry.namespace.is_none() {
            if let Some(ns) = &wanted.namespace {
                match bindings.get(ns) {
                    Some(owner) => skip_binding(&mut outcome, "namespace", ns, owner, module),
                    None => {
                        bindings.insert(ns.clone(), module.to_string());
                        entry.namespace = Some(ns.clone());
                    }
                }
            }
        }
        entry.type_only = entry.type_only && wanted.type_only;

        if entry == before && !is_new {
            continue;
        }
        if is_new && entry.is_side_effect() && !wanted.is_side_effect() {
            continue;
        }
        if is_new {
            if !outcome.added.iter().any(|m| m == module) {
                outcome.added.push(module.to_string());
            }
        } else if !outcome.added.iter().any(|m| m == module)
            && !outcome.modified.iter().any(|m| m == module)
        {
            outcome.modified.push(module.to_string());
        }
        merged.insert(entry);
    }

    outcome.merged = merged;
    outcome
}

/// Record a default or namespace binding that could not be added
///
/// These bindings are not aliased, so the existing one is kept.
fn skip_binding(outcome: &mut ReconcileOutcome, kind: &str, local: &str, owner: &str, module: &str) {
    outcome.warnings.push(format!(
        "'{local}' is already bound to '{owner}'; the {kind} import from '{module}' was not added"
    ));
    outcome.conflicts.push(ImportConflict {
        name: local.to_string(),
        kept_module: owner.to_string(),
        renamed_module: module.to_string(),
        alias: local.to_string(),
        note: format!("{kind} import not added"),
    });
}

/// Module path reduced to an identifier suffix
///
/// `@ngrx/operators` → `ngrx_operators`, `../shared/util` → `shared_util`
#[must_use]
pub fn sanitize(module: &str) -> String {
    let mut rest = module.trim_start_matches('@');
    loop {
        if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("../") {
            rest = r;
        } else {
            break;
        }
    }

    let mut out = String::with_capacity(rest.len());
    for ch in rest.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "module".to_string()
    } else {
        trimmed.to_string()
    }
}

/// How imports are laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Alphabetical within each group
    pub sort: bool,
    /// Prefixes of modules placed in the first group
    pub platform_prefixes: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sort: true,
            platform_prefixes: vec!["@angular/".to_string()],
        }
    }
}

/// Named lists longer than this wrap one per line
pub const WRAP_AFTER: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Group {
    Platform,
    Package,
    Relative,
}

fn group_of(module: &str, options: &RenderOptions) -> Group {
    if module.starts_with('.') {
        Group::Relative
    } else if options
        .platform_prefixes
        .iter()
        .any(|p| module.starts_with(p.as_str()))
    {
        Group::Platform
    } else {
        Group::Package
    }
}

/// Render a table as import statements, one group per block
#[must_use]
pub fn render_imports(table: &ImportTable, options: &RenderOptions) -> Vec<String> {
    let mut entries: Vec<&ImportEntry> = table.iter().collect();
    // Stable: unsorted output keeps table order inside each group
    entries.sort_by(|a, b| {
        let by_group = group_of(&a.module, options).cmp(&group_of(&b.module, options));
        if options.sort {
            by_group.then_with(|| a.module.cmp(&b.module))
        } else {
            by_group
        }
    });

    let mut lines = Vec::new();
    let mut current: Option<Group> = None;
    for entry in entries {
        let group = group_of(&entry.module, options);
        if current.is_some_and(|g| g != group) {
            lines.push(String::new());
        }
        current = Some(group);
        lines.extend(render_entry(entry));
    }
    lines
}

fn render_entry(entry: &ImportEntry) -> Vec<String> {
    let module = &entry.module;
    if entry.is_side_effect() {
        return vec![format!("import '{module}';")];
    }
    let keyword = if entry.type_only {
        "import type"
    } else {
        "import"
    };

    let mut lines = Vec::new();
    let mut head: Vec<String> = Vec::new();
    if let Some(default) = &entry.default_import {
        head.push(default.clone());
    }
    match (&entry.namespace, entry.named.is_empty()) {
        (Some(ns), true) => head.push(format!("* as {ns}")),
        (Some(ns), false) => {
            // `* as ns` cannot share a clause with braces
            lines.push(format!("{keyword} * as {ns} from '{module}';"));
        }
        (None, _) => {}
    }

    if entry.named.is_empty() {
        lines.push(format!("{keyword} {} from '{module}';", head.join(", ")));
        return lines;
    }

    let names: Vec<String> = entry.named.iter().map(ToString::to_string).collect();
    let prefix = if head.is_empty() {
        String::new()
    } else {
        format!("{}, ", head.join(", "))
    };
    if names.len() > WRAP_AFTER {
        lines.push(format!("{keyword} {prefix}{{"));
        lines.extend(names.iter().map(|n| format!("  {n},")));
        lines.push(format!("}} from '{module}';"));
    } else {
        lines.push(format!(
            "{keyword} {prefix}{{ {} }} from '{module}';",
            names.join(", ")
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(entries: Vec<ImportEntry>) -> ImportTable {
        entries.into_iter().collect()
    }

    #[test]
    fn union_of_named_imports() {
        let existing = table(vec![ImportEntry::named("rxjs", ["pipe"])]);
        let out = reconcile(&existing, &[ImportEntry::named("rxjs", ["pipe", "tap"])]);
        assert!(out.merged.imports_name("rxjs", "tap"));
        assert_eq!(out.modified, vec!["rxjs".to_string()]);
        assert!(out.added.is_empty());
        assert!(out.conflicts.is_empty());
    }

    #[test]
    fn new_module_is_added() {
        let out = reconcile(
            &ImportTable::new(),
            &[ImportEntry::named("@ngrx/operators", ["tapResponse"])],
        );
        assert_eq!(out.added, vec!["@ngrx/operators".to_string()]);
        assert!(out.changed());
    }

    #[test]
    fn taken_default_and_namespace_bindings_are_reported() {
        let existing = table(vec![ImportEntry::named("./legacy/helpers", ["helper", "ops"])]);
        let default = ImportEntry {
            module: "@app/helper".to_string(),
            default_import: Some("helper".to_string()),
            ..ImportEntry::default()
        };
        let namespace = ImportEntry {
            module: "@app/ops".to_string(),
            namespace: Some("ops".to_string()),
            ..ImportEntry::default()
        };
        let out = reconcile(&existing, &[default, namespace]);

        assert_eq!(out.conflicts.len(), 2);
        assert_eq!(out.conflicts[0].name, "helper");
        assert_eq!(out.conflicts[0].kept_module, "./legacy/helpers");
        assert_eq!(out.conflicts[0].renamed_module, "@app/helper");
        assert_eq!(out.conflicts[1].note, "namespace import not added");
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings[0].contains("default import from '@app/helper' was not added"));
        assert!(!out.merged.contains_module("@app/helper"));
        assert!(!out.merged.contains_module("@app/ops"));
        assert!(!out.changed());
    }

    #[test]
    fn conflicting_binding_is_renamed() {
        let existing = table(vec![ImportEntry::named("./legacy/helpers", ["helper"])]);
        let out = reconcile(&existing, &[ImportEntry::named("@app/shared", ["helper"])]);
        assert_eq!(out.conflicts.len(), 1);
        let conflict = &out.conflicts[0];
        assert_eq!(conflict.kept_module, "./legacy/helpers");
        assert_eq!(conflict.renamed_module, "@app/shared");
        assert_eq!(conflict.alias, "helper_app_shared");
        assert_eq!(out.binding_for("@app/shared", "helper"), "helper_app_shared");
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn value_import_clears_type_only() {
        let mut types = ImportEntry::named("./model", ["Todo"]);
        types.type_only = true;
        let existing = table(vec![types]);
        let out = reconcile(&existing, &[ImportEntry::named("./model", ["Todo"])]);
        assert!(!out.merged.get("./model").is_some_and(|e| e.type_only));
        assert_eq!(out.modified, vec!["./model".to_string()]);
    }

    #[test]
    fn existing_default_wins() {
        let existing = table(vec![ImportEntry::side_effect("lodash").with_default("_")]);
        let out = reconcile(
            &existing,
            &[ImportEntry::side_effect("lodash").with_default("lodash")],
        );
        assert_eq!(
            out.merged.get("lodash").and_then(|e| e.default_import.clone()),
            Some("_".to_string())
        );
        assert!(!out.changed());
    }

    #[test]
    fn sanitize_module_paths() {
        assert_eq!(sanitize("@ngrx/operators"), "ngrx_operators");
        assert_eq!(sanitize("../shared/rx-helpers"), "shared_rx_helpers");
        assert_eq!(sanitize("./a//b"), "a_b");
        assert_eq!(sanitize("@/"), "module");
    }

    #[test]
    fn render_groups_and_wraps() {
        let t = table(vec![
            ImportEntry::named("./project.service", ["ProjectService"]),
            ImportEntry::named("rxjs", ["pipe", "tap", "switchMap", "from"]),
            ImportEntry::named("@angular/core", ["inject"]),
            ImportEntry::named("@ngrx/signals", ["patchState"]),
        ]);
        let lines = render_imports(&t, &RenderOptions::default());
        assert_eq!(
            lines,
            vec![
                "import { inject } from '@angular/core';",
                "",
                "import { patchState } from '@ngrx/signals';",
                "import {",
                "  from,",
                "  pipe,",
                "  switchMap,",
                "  tap,",
                "} from 'rxjs';",
                "",
                "import { ProjectService } from './project.service';",
            ]
        );
    }

    #[test]
    fn render_namespace_and_type_only() {
        let mut types = ImportEntry::named("./model", ["Todo"]);
        types.type_only = true;
        let t = table(vec![
            types,
            ImportEntry::named("rxjs", ["of"]).with_namespace("rx"),
        ]);
        let lines = render_imports(&t, &RenderOptions::default());
        assert_eq!(
            lines,
            vec![
                "import * as rx from 'rxjs';",
                "import { of } from 'rxjs';",
                "",
                "import type { Todo } from './model';",
            ]
        );
    }
}
