//! File-level context gathered by the scanner

use super::imports::ImportTable;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Default name of the state container binding
pub const DEFAULT_STATE_CONTAINER: &str = "store";

/// Everything downstream stages need to know about a file besides its methods
///
/// One per file; read-only once the scanner returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    /// Declared state slice names, in declaration order
    pub state_fields: IndexSet<String>,
    /// Injected collaborator bindings
    pub collaborators: IndexSet<String>,
    /// Methods already written as reactive-pipeline methods
    pub converted_methods: IndexSet<String>,
    /// Existing imports
    pub imports: ImportTable,
    /// 1-based inclusive line runs made only of import statements, in file order
    pub import_runs: Vec<(usize, usize)>,
    /// An import statement shares a line with other code or a comment
    pub import_lines_shared: bool,
    /// Name of the loading flag field, if declared
    pub loading_field: Option<String>,
    /// Name of the error field, if declared
    pub error_field: Option<String>,
    /// Binding through which state is patched
    pub state_container: String,
}

impl Default for FileContext {
    fn default() -> Self {
        Self {
            state_fields: IndexSet::new(),
            collaborators: IndexSet::new(),
            converted_methods: IndexSet::new(),
            imports: ImportTable::new(),
            import_runs: Vec::new(),
            import_lines_shared: false,
            loading_field: None,
            error_field: None,
            state_container: DEFAULT_STATE_CONTAINER.to_string(),
        }
    }
}

impl FileContext {
    /// Whether a loading flag is declared
    #[inline]
    #[must_use]
    pub fn has_loading_flag(&self) -> bool {
        self.loading_field.is_some()
    }

    /// Whether an error field is declared
    #[inline]
    #[must_use]
    pub fn has_error_flag(&self) -> bool {
        self.error_field.is_some()
    }

    /// Loading field name to emit (`loading` when undeclared)
    #[inline]
    #[must_use]
    pub fn loading_field_or_default(&self) -> &str {
        self.loading_field.as_deref().unwrap_or("loading")
    }

    /// Error field name to emit (`error` when undeclared)
    #[inline]
    #[must_use]
    pub fn error_field_or_default(&self) -> &str {
        self.error_field.as_deref().unwrap_or("error")
    }

    /// Whether `name` is a declared state slice
    #[inline]
    #[must_use]
    pub fn has_state_field(&self, name: &str) -> bool {
        self.state_fields.contains(name)
    }

    /// Lines from the first import to the last, 1-based inclusive
    ///
    /// Other code may sit between the runs.
    #[must_use]
    pub fn import_span(&self) -> Option<(usize, usize)> {
        Some((self.import_runs.first()?.0, self.import_runs.last()?.1))
    }

    /// Whether `name` is already a reactive-pipeline method
    #[inline]
    #[must_use]
    pub fn is_converted(&self, name: &str) -> bool {
        self.converted_methods.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fall_back_to_conventional_names() {
        let ctx = FileContext::default();
        assert!(!ctx.has_loading_flag());
        assert_eq!(ctx.loading_field_or_default(), "loading");
        assert_eq!(ctx.error_field_or_default(), "error");
        assert_eq!(ctx.state_container, "store");
    }

    #[test]
    fn declared_flags_are_used() {
        let ctx = FileContext {
            loading_field: Some("isLoading".to_string()),
            error_field: Some("errorMessage".to_string()),
            ..FileContext::default()
        };
        assert!(ctx.has_loading_flag());
        assert_eq!(ctx.loading_field_or_default(), "isLoading");
        assert_eq!(ctx.error_field_or_default(), "errorMessage");
    }

    #[test]
    fn import_span_covers_every_run() {
        let ctx = FileContext {
            import_runs: vec![(1, 2), (5, 5)],
            ..FileContext::default()
        };
        assert_eq!(ctx.import_span(), Some((1, 5)));
        assert_eq!(FileContext::default().import_span(), None);
    }
}
