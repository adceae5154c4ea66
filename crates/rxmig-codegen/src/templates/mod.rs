//! Template Generator
//!
//! One sub-generator per [`PatternLabel`]. Each produces a
//! [`GeneratedMethod`]: the pipeline input, ordered stages, the imports the
//! stages reference, and notes for the report. Stages are host-aware: object
//! literal stores patch through the state container, class stores write
//! signals through `this`.
//!
//! Stage text uses two-space relative indentation; the renderer adds the
//! method's own indentation.

mod bulk;
mod custom;
mod optimistic;
mod simple_load;

use indexmap::IndexMap;
use rxmig_core::{
    FileContext, ImportEntry, ImportSpecifier, MethodHost, MethodRecord, Parameter, PatternLabel,
    MANUAL_REVIEW_MARKER,
};
use std::collections::BTreeSet;

/// `pipe`, `tap`, `switchMap`, ...
pub const RXJS: &str = "rxjs";
/// `patchState`
pub const SIGNALS: &str = "@ngrx/signals";
/// `rxMethod`
pub const RXJS_INTEROP: &str = "@ngrx/signals/rxjs-interop";
/// `tapResponse`
pub const OPERATORS: &str = "@ngrx/operators";

/// Options the templates read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Module exporting `optimisticUpdate` and `bulkOperation`
    pub helper_module: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            helper_module: "@app/shared/rx-helpers".to_string(),
        }
    }
}

/// What flows into the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInput {
    /// `rxMethod<...>` type argument
    pub type_text: String,
    /// Arrow parameter list receiving the input, parentheses included
    pub binding: String,
    /// Expression that rebuilds the input from the original parameters
    pub value: String,
}

impl MethodInput {
    /// Project the original parameter list onto one pipeline input
    ///
    /// No parameters map to `void`; one parameter keeps its type; several are
    /// packed into an object and destructured again on the way in.
    #[must_use]
    pub fn from_params(params: &[Parameter]) -> Self {
        match params {
            [] => Self {
                type_text: "void".to_string(),
                binding: "()".to_string(),
                value: "undefined".to_string(),
            },
            [single] => Self {
                type_text: param_type(single),
                binding: format!("({})", single.name),
                value: single.name.clone(),
            },
            many => {
                let fields: Vec<String> = many
                    .iter()
                    .map(|p| {
                        let optional = if p.optional || p.default_value.is_some() {
                            "?"
                        } else {
                            ""
                        };
                        format!("{}{optional}: {}", p.name, param_type(p))
                    })
                    .collect();
                let pattern: Vec<String> = many
                    .iter()
                    .map(|p| match &p.default_value {
                        Some(default) => format!("{} = {default}", p.name),
                        None => p.name.clone(),
                    })
                    .collect();
                let names: Vec<&str> = many.iter().map(|p| p.name.as_str()).collect();
                Self {
                    type_text: format!("{{ {} }}", fields.join("; ")),
                    binding: format!("({{ {} }})", pattern.join(", ")),
                    value: format!("{{ {} }}", names.join(", ")),
                }
            }
        }
    }

    /// Whether the pipeline takes no input
    #[inline]
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.type_text == "void"
    }
}

fn param_type(param: &Parameter) -> String {
    if let Some(ty) = &param.type_text {
        return ty.clone();
    }
    match param.default_value.as_deref().map(str::trim) {
        Some("true" | "false") => "boolean".to_string(),
        Some(v) if v.starts_with(['\'', '"', '`']) => "string".to_string(),
        Some(v) if v.parse::<f64>().is_ok() => "number".to_string(),
        _ => "unknown".to_string(),
    }
}

/// A generated reactive-pipeline method before layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMethod {
    /// Template that produced it
    pub label: PatternLabel,
    /// Pipeline input
    pub input: MethodInput,
    /// Stages passed to `pipe(...)`, in order, without trailing commas
    pub stages: Vec<String>,
    /// Imports the stages reference
    pub imports: Vec<ImportEntry>,
    /// Findings for the report
    pub notes: Vec<String>,
    /// Output contains review-marked stubs
    pub review: bool,
    /// Comment lines placed above the method, without `//`
    pub leading_comments: Vec<String>,
}

/// Generate the pipeline for one method
#[must_use]
pub fn generate(
    record: &MethodRecord,
    label: PatternLabel,
    context: &FileContext,
    options: &TemplateOptions,
) -> GeneratedMethod {
    let scope = Scope {
        record,
        context,
        options,
    };
    let generated = match label {
        PatternLabel::SimpleLoad => simple_load::generate(&scope),
        PatternLabel::OptimisticUpdate => optimistic::generate(&scope),
        PatternLabel::BulkOperation => bulk::generate(&scope),
        PatternLabel::CustomFallback => custom::generate(&scope),
    };
    tracing::trace!(
        method = record.name(),
        template = %generated.label,
        stages = generated.stages.len(),
        review = generated.review,
        "generated pipeline"
    );
    generated
}

/// Inputs shared by the sub-generators
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub(crate) record: &'a MethodRecord,
    pub(crate) context: &'a FileContext,
    pub(crate) options: &'a TemplateOptions,
}

impl Scope<'_> {
    pub(crate) fn host(&self) -> MethodHost {
        self.record.host()
    }

    /// Expression writing `(field, value)` pairs to state
    pub(crate) fn write(&self, writes: &[(&str, &str)]) -> String {
        match self.host() {
            MethodHost::ObjectLiteral => {
                let pairs: Vec<String> = writes
                    .iter()
                    .map(|(field, value)| {
                        if field == value {
                            (*field).to_string()
                        } else {
                            format!("{field}: {value}")
                        }
                    })
                    .collect();
                format!(
                    "patchState({}, {{ {} }})",
                    self.context.state_container,
                    pairs.join(", ")
                )
            }
            MethodHost::Class => {
                let sets: Vec<String> = writes
                    .iter()
                    .map(|(field, value)| format!("this.{field}.set({value})"))
                    .collect();
                match sets.as_slice() {
                    [one] => one.clone(),
                    _ => format!("{{ {}; }}", sets.join("; ")),
                }
            }
        }
    }

    /// `tap` stage switching the loading flag on and clearing the error
    pub(crate) fn loading_on(&self) -> String {
        let loading = self.context.loading_field_or_default();
        match &self.context.error_field {
            Some(error) => format!("tap(() => {})", self.write(&[(loading, "true"), (error, "null")])),
            None => format!("tap(() => {})", self.write(&[(loading, "true")])),
        }
    }

    /// `tapResponse({ next, error, finalize })` lines
    pub(crate) fn response_handlers(&self, next: &str, with_loading: bool) -> Vec<String> {
        let mut lines = vec!["tapResponse({".to_string(), format!("  next: {next},")];
        match &self.context.error_field {
            Some(error) => lines.push(format!(
                "  error: (error: unknown) => {},",
                self.write(&[(error, "String(error)")])
            )),
            None => lines.push("  error: (error: unknown) => console.error(error),".to_string()),
        }
        if with_loading {
            let loading = self.context.loading_field_or_default();
            lines.push(format!("  finalize: () => {},", self.write(&[(loading, "false")])));
        }
        lines.push("})".to_string());
        lines
    }

    /// Note recorded when errors have nowhere to go
    pub(crate) fn error_field_note(&self) -> Option<String> {
        (!self.context.has_error_flag())
            .then(|| "no error field declared in state; errors are logged to the console".to_string())
    }
}

/// Stub text that stands in for something the template could not infer
pub(crate) fn review_stub(what: &str) -> String {
    format!("/* {MANUAL_REVIEW_MARKER} {what} */")
}

/// Indent every line of `lines` by `depth` two-space steps
pub(crate) fn indented(lines: &[String], depth: usize) -> Vec<String> {
    let pad = "  ".repeat(depth);
    lines
        .iter()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("{pad}{l}")
            }
        })
        .collect()
}

/// Append a comma to the last line
pub(crate) fn trailing_comma(mut lines: Vec<String>) -> Vec<String> {
    if let Some(last) = lines.last_mut() {
        last.push(',');
    }
    lines
}

/// Collects imports as `(module, name)` pairs in first-use order
#[derive(Debug, Default)]
pub(crate) struct ImportSet {
    modules: IndexMap<String, BTreeSet<String>>,
}

impl ImportSet {
    pub(crate) fn add(&mut self, module: &str, names: &[&str]) -> &mut Self {
        let set = self.modules.entry(module.to_string()).or_default();
        set.extend(names.iter().map(|n| (*n).to_string()));
        self
    }

    /// Imports every pipeline needs
    pub(crate) fn base(scope: &Scope<'_>) -> Self {
        let mut set = Self::default();
        set.add(RXJS_INTEROP, &["rxMethod"]).add(RXJS, &["pipe"]);
        if scope.host() == MethodHost::ObjectLiteral {
            set.add(SIGNALS, &["patchState"]);
        }
        set
    }

    pub(crate) fn into_entries(self) -> Vec<ImportEntry> {
        self.modules
            .into_iter()
            .map(|(module, names)| ImportEntry {
                module,
                named: names.into_iter().map(ImportSpecifier::new).collect(),
                ..ImportEntry::default()
            })
            .collect()
    }
}

/// Name with its load verb removed and the first letter lowered
pub(crate) fn subject_of(name: &str) -> Option<String> {
    const VERBS: [&str; 5] = ["reload", "refresh", "fetch", "load", "get"];
    let rest = VERBS.iter().find_map(|v| name.strip_prefix(v))?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    first
        .is_ascii_uppercase()
        .then(|| first.to_ascii_lowercase().to_string() + chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn input_projection() {
        let none = MethodInput::from_params(&[]);
        assert!(none.is_void());
        assert_eq!(none.value, "undefined");

        let one = MethodInput::from_params(&[Parameter::new("filter").with_type("string")]);
        assert_eq!(one.type_text, "string");
        assert_eq!(one.binding, "(filter)");

        let mut force = Parameter::new("force");
        force.default_value = Some("false".to_string());
        let many = MethodInput::from_params(&[Parameter::new("mode").with_type("string"), force]);
        assert_eq!(many.type_text, "{ mode: string; force?: boolean }");
        assert_eq!(many.binding, "({ mode, force = false })");
        assert_eq!(many.value, "{ mode, force }");
    }

    #[test]
    fn subject_strips_load_verbs() {
        assert_eq!(subject_of("loadProjects").as_deref(), Some("projects"));
        assert_eq!(subject_of("fetchUserList").as_deref(), Some("userList"));
        assert_eq!(subject_of("getter"), None);
        assert_eq!(subject_of("synchronize"), None);
    }

    #[test]
    fn state_writes_follow_host() {
        let ctx = FileContext::default();
        let options = TemplateOptions::default();
        let object = MethodRecord::builder("a").build();
        let scope = Scope {
            record: &object,
            context: &ctx,
            options: &options,
        };
        assert_eq!(
            scope.write(&[("projects", "projects"), ("loading", "false")]),
            "patchState(store, { projects, loading: false })"
        );

        let class = MethodRecord::builder("a").host(MethodHost::Class).build();
        let scope = Scope {
            record: &class,
            ..scope
        };
        assert_eq!(scope.write(&[("users", "users")]), "this.users.set(users)");
        assert_eq!(
            scope.write(&[("isLoading", "true"), ("errorMessage", "null")]),
            "{ this.isLoading.set(true); this.errorMessage.set(null); }"
        );
    }

    #[test]
    fn import_set_groups_by_module() {
        let mut set = ImportSet::default();
        set.add(RXJS, &["tap", "pipe"]).add(OPERATORS, &["tapResponse"]).add(RXJS, &["tap"]);
        let entries = set.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].module, RXJS);
        assert_eq!(entries[0].named.len(), 2);
    }
}
