//! File-level context collection
//!
//! One walk over the tree gathers:
//! - the import table and the line span of the leading import block
//! - state slice names (`withState`, `*State` interfaces and type aliases,
//!   `initialState` literals, `signal(...)` class fields)
//! - injected collaborators and the state container binding
//! - members that already hold an `rxMethod(...)` pipeline

use crate::detectors::COLLABORATOR_SUFFIXES;
use crate::language::{children, named_children, node_text};
use rxmig_core::{FileContext, ImportEntry, ImportSpecifier};
use std::collections::HashMap;
use tree_sitter::{Node, Tree};

/// Collect the context of a parsed file
#[must_use]
pub fn collect_context(tree: &Tree, source: &str) -> FileContext {
    let root = tree.root_node();
    let mut collector = Collector {
        source,
        ctx: FileContext::default(),
        objects: HashMap::new(),
    };
    collector.index_objects(root);
    collector.collect_imports(root);
    collector.walk(root);
    collector.finish()
}

struct Collector<'t, 's> {
    source: &'s str,
    ctx: FileContext,
    /// `const name = { ... }` declarations, for resolving `withState(name)`
    objects: HashMap<&'s str, Node<'t>>,
}

impl<'t, 's> Collector<'t, 's> {
    fn text(&self, node: Node<'_>) -> &'s str {
        node_text(node, self.source)
    }

    fn index_objects(&mut self, node: Node<'t>) {
        if node.kind() == "variable_declarator" {
            if let (Some(name), Some(value)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("value").map(unwrap_expression),
            ) {
                if value.kind() == "object" {
                    self.objects.insert(self.text(name), value);
                }
            }
        }
        for child in named_children(node) {
            self.index_objects(child);
        }
    }

    fn collect_imports(&mut self, root: Node<'t>) {
        let mut import_lines: Vec<(usize, usize)> = Vec::new();
        let mut other_lines: Vec<(usize, usize)> = Vec::new();
        for node in named_children(root) {
            let lines = (node.start_position().row + 1, node.end_position().row + 1);
            let entry = (node.kind() == "import_statement")
                .then(|| self.import_entry(node))
                .flatten();
            let Some(entry) = entry else {
                other_lines.push(lines);
                continue;
            };
            import_lines.push(lines);
            match self.ctx.imports.get_mut(&entry.module) {
                Some(existing) => {
                    existing.named.extend(entry.named);
                    existing.default_import = existing.default_import.take().or(entry.default_import);
                    existing.namespace = existing.namespace.take().or(entry.namespace);
                    existing.type_only &= entry.type_only;
                }
                None => {
                    self.ctx.imports.insert(entry);
                }
            }
        }
        self.ctx.import_lines_shared = import_lines
            .iter()
            .any(|&(s, e)| other_lines.iter().any(|&(os, oe)| os <= e && s <= oe));
        self.ctx.import_runs = import_runs(&import_lines);
    }

    fn import_entry(&self, stmt: Node<'t>) -> Option<ImportEntry> {
        let module = unquote(self.text(stmt.child_by_field_name("source")?));
        let mut entry = ImportEntry::side_effect(module);
        entry.type_only = children(stmt).iter().any(|c| c.kind() == "type");

        let Some(clause) = named_children(stmt)
            .into_iter()
            .find(|c| c.kind() == "import_clause")
        else {
            return Some(entry);
        };
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => entry.default_import = Some(self.text(part).to_string()),
                "namespace_import" => {
                    entry.namespace = named_children(part)
                        .into_iter()
                        .find(|c| c.kind() == "identifier")
                        .map(|c| self.text(c).to_string());
                }
                "named_imports" => {
                    for spec in named_children(part)
                        .into_iter()
                        .filter(|s| s.kind() == "import_specifier")
                    {
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let name = self.text(name);
                        entry.named.insert(match spec.child_by_field_name("alias") {
                            Some(alias) => ImportSpecifier::aliased(name, self.text(alias)),
                            None => ImportSpecifier::new(name),
                        });
                    }
                }
                _ => {}
            }
        }
        Some(entry)
    }

    fn walk(&mut self, node: Node<'t>) {
        match node.kind() {
            "call_expression" => self.visit_call(node),
            "interface_declaration" | "type_alias_declaration" => self.visit_state_type(node),
            "variable_declarator" => self.visit_declarator(node),
            "required_parameter" | "optional_parameter" => self.visit_parameter(node),
            "public_field_definition" => self.visit_field(node),
            "pair" => {
                if let (Some(key), Some(value)) = (
                    node.child_by_field_name("key"),
                    node.child_by_field_name("value"),
                ) {
                    if callee(value, self.source) == Some("rxMethod") {
                        self.ctx.converted_methods.insert(unquote(self.text(key)).to_string());
                    }
                }
            }
            _ => {}
        }
        for child in named_children(node) {
            self.walk(child);
        }
    }

    fn visit_call(&mut self, node: Node<'t>) {
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        let Some(first) = named_children(args).into_iter().next() else {
            return;
        };
        match callee(node, self.source) {
            Some("withState") => {
                let first = unwrap_expression(first);
                let object = match first.kind() {
                    "object" => Some(first),
                    "identifier" => self.objects.get(self.text(first)).copied(),
                    _ => None,
                };
                if let Some(object) = object {
                    self.add_object_keys(object);
                }
            }
            Some("withMethods") if first.kind() == "arrow_function" => {
                if let Some(param) = first_arrow_param(first, self.source) {
                    self.ctx.state_container = param.to_string();
                }
            }
            _ => {}
        }
    }

    fn visit_state_type(&mut self, node: Node<'t>) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        if !self.text(name).ends_with("State") {
            return;
        }
        let body = node
            .child_by_field_name("body")
            .or_else(|| node.child_by_field_name("value"));
        let Some(body) = body.filter(|b| matches!(b.kind(), "interface_body" | "object_type"))
        else {
            return;
        };
        for sig in named_children(body)
            .into_iter()
            .filter(|s| s.kind() == "property_signature")
        {
            if let Some(key) = sig.child_by_field_name("name") {
                self.ctx.state_fields.insert(unquote(self.text(key)).to_string());
            }
        }
    }

    fn visit_declarator(&mut self, node: Node<'t>) {
        let (Some(name), Some(value)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("value"),
        ) else {
            return;
        };
        let name = self.text(name);
        match callee(value, self.source) {
            Some("inject") => {
                self.ctx.collaborators.insert(name.to_string());
            }
            Some("rxMethod") => {
                self.ctx.converted_methods.insert(name.to_string());
            }
            _ => {}
        }
        let value = unwrap_expression(value);
        if value.kind() == "object" && name.ends_with("nitialState") {
            self.add_object_keys(value);
        }
    }

    fn visit_parameter(&mut self, node: Node<'t>) {
        let Some(pattern) = node.child_by_field_name("pattern") else {
            return;
        };
        let injected = node
            .child_by_field_name("value")
            .is_some_and(|v| callee(v, self.source) == Some("inject"));
        let parameter_property = children(node)
            .iter()
            .any(|c| c.kind() == "accessibility_modifier");
        let typed_collaborator = is_constructor_param(node, self.source)
            && node.child_by_field_name("type").is_some_and(|t| {
                let ty = self.text(t);
                COLLABORATOR_SUFFIXES.iter().any(|s| ty.trim_end().ends_with(s))
            });
        if injected || parameter_property || typed_collaborator {
            self.ctx.collaborators.insert(self.text(pattern).to_string());
        }
    }

    fn visit_field(&mut self, node: Node<'t>) {
        let (Some(name), Some(value)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("value"),
        ) else {
            return;
        };
        let name = self.text(name).to_string();
        match callee(value, self.source) {
            Some("inject") => {
                self.ctx.collaborators.insert(name);
            }
            Some("rxMethod") => {
                self.ctx.converted_methods.insert(name);
            }
            Some("signal") => {
                self.ctx.state_fields.insert(name);
            }
            _ => {}
        }
    }

    fn add_object_keys(&mut self, object: Node<'t>) {
        for member in named_children(object) {
            let key = match member.kind() {
                "pair" => member.child_by_field_name("key"),
                "shorthand_property_identifier" => Some(member),
                _ => None,
            };
            if let Some(key) = key {
                self.ctx.state_fields.insert(unquote(self.text(key)).to_string());
            }
        }
    }

    fn finish(mut self) -> FileContext {
        self.ctx.loading_field = self
            .ctx
            .state_fields
            .iter()
            .find(|f| is_loading_name(f))
            .cloned();
        self.ctx.error_field = self
            .ctx
            .state_fields
            .iter()
            .find(|f| is_error_name(f))
            .cloned();
        self.ctx
    }
}

/// Whether a field name reads as a loading flag
#[must_use]
pub fn is_loading_name(name: &str) -> bool {
    matches!(name, "loading" | "isLoading") || name.ends_with("Loading")
}

/// Whether a field name reads as an error slot
#[must_use]
pub fn is_error_name(name: &str) -> bool {
    matches!(name, "error" | "errorMessage") || name.ends_with("Error")
}

/// Name of the function a call expression invokes
fn callee<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    let node = unwrap_expression(node);
    if node.kind() != "call_expression" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    Some(node_text(function, source))
}

/// Strip `as`, `satisfies` and parentheses around an expression
fn unwrap_expression(node: Node<'_>) -> Node<'_> {
    match node.kind() {
        "as_expression" | "satisfies_expression" | "parenthesized_expression"
        | "non_null_expression" => node
            .named_child(0)
            .map_or(node, unwrap_expression),
        _ => node,
    }
}

fn first_arrow_param<'s>(arrow: Node<'_>, source: &'s str) -> Option<&'s str> {
    if let Some(single) = arrow.child_by_field_name("parameter") {
        return Some(node_text(single, source));
    }
    let params = arrow.child_by_field_name("parameters")?;
    let first = named_children(params).into_iter().next()?;
    first
        .child_by_field_name("pattern")
        .map(|p| node_text(p, source))
}

fn is_constructor_param(param: Node<'_>, source: &str) -> bool {
    param
        .parent()
        .and_then(|params| params.parent())
        .filter(|m| m.kind() == "method_definition")
        .and_then(|m| m.child_by_field_name("name"))
        .is_some_and(|n| node_text(n, source) == "constructor")
}

#[inline]
fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '\'' || c == '"' || c == '`')
}

/// Merge statement line ranges into runs of adjacent lines
fn import_runs(statements: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &(start, end) in statements {
        match runs.last_mut() {
            Some(run) if start <= run.1 + 1 => run.1 = run.1.max(end),
            _ => runs.push((start, end)),
        }
    }
    runs
}
