//! Method records produced by the scanner

use serde::{Deserialize, Serialize};

/// Recognised method shapes, each selecting one code-generation template
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternLabel {
    /// Load data through one collaborator call with loading/error flags
    SimpleLoad,
    /// Mutate local state first, call remote, roll back on failure
    OptimisticUpdate,
    /// Fan an array of inputs out into per-item calls
    BulkOperation,
    /// Last resort: scaffolding plus the original body for manual work
    CustomFallback,
}

impl PatternLabel {
    /// All labels in tie-break order
    pub const ALL: [PatternLabel; 4] = [
        PatternLabel::SimpleLoad,
        PatternLabel::OptimisticUpdate,
        PatternLabel::BulkOperation,
        PatternLabel::CustomFallback,
    ];

    /// Stable kebab-case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternLabel::SimpleLoad => "simple-load",
            PatternLabel::OptimisticUpdate => "optimistic-update",
            PatternLabel::BulkOperation => "bulk-operation",
            PatternLabel::CustomFallback => "custom-fallback",
        }
    }
}

impl std::fmt::Display for PatternLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter of a candidate method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (or destructuring pattern text)
    pub name: String,
    /// Declared type, without the leading colon
    pub type_text: Option<String>,
    /// Declared with `?`
    pub optional: bool,
    /// Default value expression
    pub default_value: Option<String>,
}

impl Parameter {
    /// Create required untyped parameter
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_text: None,
            optional: false,
            default_value: None,
        }
    }

    /// With declared type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, type_text: impl Into<String>) -> Self {
        self.type_text = Some(type_text.into());
        self
    }

    /// Whether the declared type is an array
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.type_text.as_deref().is_some_and(|t| {
            let t = t.trim();
            t.ends_with("[]") || t.starts_with("Array<") || t.starts_with("ReadonlyArray<")
        })
    }

    /// Element type of an array parameter
    #[must_use]
    pub fn element_type(&self) -> Option<String> {
        let t = self.type_text.as_deref()?.trim();
        if let Some(inner) = t.strip_suffix("[]") {
            let inner = inner.trim();
            let inner = inner
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(inner);
            return Some(inner.to_string());
        }
        t.strip_prefix("ReadonlyArray<")
            .or_else(|| t.strip_prefix("Array<"))
            .and_then(|s| s.strip_suffix('>'))
            .map(|s| s.trim().to_string())
    }

    /// Declared type, `unknown` when absent
    #[inline]
    #[must_use]
    pub fn type_or_unknown(&self) -> &str {
        self.type_text.as_deref().unwrap_or("unknown")
    }

    /// Render as it appears in a parameter list
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.name.clone();
        if self.optional {
            out.push('?');
        }
        if let Some(ty) = &self.type_text {
            out.push_str(": ");
            out.push_str(ty);
        }
        if let Some(default) = &self.default_value {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

/// Declared result type of a suspending procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "kebab-case")]
pub enum ResultType {
    /// `Promise<void>` or no annotation
    Void,
    /// `Promise<T>`
    Value(String),
    /// Anything else, kept verbatim
    Other(String),
}

impl ResultType {
    /// Classify a return type annotation (without the leading colon)
    #[must_use]
    pub fn from_annotation(annotation: Option<&str>) -> Self {
        let Some(text) = annotation.map(str::trim).filter(|t| !t.is_empty()) else {
            return ResultType::Void;
        };
        match text.strip_prefix("Promise<").and_then(|s| s.strip_suffix('>')) {
            Some(inner) if inner.trim() == "void" => ResultType::Void,
            Some(inner) => ResultType::Value(inner.trim().to_string()),
            None => ResultType::Other(text.to_string()),
        }
    }

    /// Annotation text to emit on a compatibility wrapper
    #[must_use]
    pub fn declared(&self) -> String {
        match self {
            ResultType::Void => "Promise<void>".to_string(),
            ResultType::Value(inner) => format!("Promise<{inner}>"),
            ResultType::Other(text) => text.clone(),
        }
    }

    /// Whether callers receive no value
    #[inline]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, ResultType::Void)
    }
}

/// Where a candidate method is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodHost {
    /// Member of an object literal, e.g. inside `withMethods`
    ObjectLiteral,
    /// Member of a class body
    Class,
}

/// Boolean textual markers detected in a method body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyMarkers {
    /// Contains `try`/`catch` or `.catch(`
    pub has_error_handling: bool,
    /// Sets a loading flag on and off
    pub has_loading_toggle: bool,
    /// Mentions rollback/revert or captures previous state
    pub has_rollback_marker: bool,
}

/// A candidate suspending procedure
///
/// Created once by the scanner and never mutated afterwards.
///
/// # Invariants
/// - `start_line <= end_line` (1-based, inclusive)
/// - `source` is the verbatim text of lines `start_line..=end_line`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    name: String,
    params: Vec<Parameter>,
    result_type: ResultType,
    body: String,
    source: String,
    start_line: usize,
    end_line: usize,
    indent: String,
    host: MethodHost,
    markers: BodyMarkers,
    dependencies: Vec<String>,
    pattern_guess: PatternLabel,
    confidence: u8,
}

impl MethodRecord {
    /// Start building a record
    #[inline]
    #[must_use]
    pub fn builder(name: impl Into<String>) -> MethodRecordBuilder {
        MethodRecordBuilder::new(name)
    }

    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Declared result type
    #[inline]
    #[must_use]
    pub fn result_type(&self) -> &ResultType {
        &self.result_type
    }

    /// Body text including the enclosing braces
    #[inline]
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Verbatim text of the full line span
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// First line (1-based)
    #[inline]
    #[must_use]
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// Last line (1-based, inclusive)
    #[inline]
    #[must_use]
    pub fn end_line(&self) -> usize {
        self.end_line
    }

    /// Leading whitespace of the first line
    #[inline]
    #[must_use]
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Declaration host
    #[inline]
    #[must_use]
    pub fn host(&self) -> MethodHost {
        self.host
    }

    /// Detected body markers
    #[inline]
    #[must_use]
    pub fn markers(&self) -> BodyMarkers {
        self.markers
    }

    /// Collaborator and state-mutation calls, deduplicated
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Coarse guess made by the scanner
    #[inline]
    #[must_use]
    pub fn pattern_guess(&self) -> PatternLabel {
        self.pattern_guess
    }

    /// Placeholder confidence (always 0 until classified)
    #[inline]
    #[must_use]
    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    /// First array-typed parameter
    #[inline]
    #[must_use]
    pub fn array_param(&self) -> Option<&Parameter> {
        self.params.iter().find(|p| p.is_array())
    }

    /// Number of lines spanned
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// Whether two records share any line
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &MethodRecord) -> bool {
        self.start_line <= other.end_line && other.start_line <= self.end_line
    }
}

/// Builder for [`MethodRecord`]
#[derive(Debug, Clone)]
pub struct MethodRecordBuilder {
    record: MethodRecord,
}

impl MethodRecordBuilder {
    /// Create builder with defaults
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            record: MethodRecord {
                name: name.into(),
                params: Vec::new(),
                result_type: ResultType::Void,
                body: String::new(),
                source: String::new(),
                start_line: 1,
                end_line: 1,
                indent: String::new(),
                host: MethodHost::ObjectLiteral,
                markers: BodyMarkers::default(),
                dependencies: Vec::new(),
                pattern_guess: PatternLabel::CustomFallback,
                confidence: 0,
            },
        }
    }

    /// With parameters
    #[must_use]
    pub fn params(mut self, params: Vec<Parameter>) -> Self {
        self.record.params = params;
        self
    }

    /// With result type
    #[must_use]
    pub fn result_type(mut self, result_type: ResultType) -> Self {
        self.record.result_type = result_type;
        self
    }

    /// With body text
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.record.body = body.into();
        self
    }

    /// With verbatim source and its line span
    #[must_use]
    pub fn span(mut self, source: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        self.record.source = source.into();
        self.record.start_line = start_line;
        self.record.end_line = end_line.max(start_line);
        self
    }

    /// With indentation
    #[must_use]
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.record.indent = indent.into();
        self
    }

    /// With host
    #[must_use]
    pub fn host(mut self, host: MethodHost) -> Self {
        self.record.host = host;
        self
    }

    /// With markers
    #[must_use]
    pub fn markers(mut self, markers: BodyMarkers) -> Self {
        self.record.markers = markers;
        self
    }

    /// With dependencies
    #[must_use]
    pub fn dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.record.dependencies = dependencies;
        self
    }

    /// With coarse pattern guess
    #[must_use]
    pub fn pattern_guess(mut self, label: PatternLabel) -> Self {
        self.record.pattern_guess = label;
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> MethodRecord {
        self.record
    }
}
