//! Checks run on a converted file before it is kept

use rxmig_core::{ConversionRecord, ErrorCategory, GenerationResult, ImportTable, ValidationReport};
use rxmig_scanner::scan_source;
use std::time::Instant;

/// Calls that intercept errors inside a pipeline
const ERROR_HANDLERS: [&str; 4] = ["tapResponse(", "catchError(", "optimisticUpdate(", "bulkOperation("];

/// Calls that turn a pipeline back into a promise
const PROMISE_BRIDGES: [&str; 2] = ["firstValueFrom(", "lastValueFrom("];

/// Post-conversion validator
#[derive(Debug, Clone, Copy, Default)]
pub struct PostValidator;

impl PostValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check a converted file and the conversions that produced it
    #[must_use]
    pub fn validate(&self, result: &GenerationResult, conversions: &[ConversionRecord]) -> ValidationReport {
        let started = Instant::now();
        let mut report = ValidationReport::new();

        if !result.is_modified() {
            report.note("file unchanged");
            return report.finish(started);
        }

        match scan_source(&result.path, &result.converted_code) {
            Ok(scanned) => {
                check_imports(&scanned.context.imports, !conversions.is_empty(), &mut report);
                if !scanned.methods.is_empty() {
                    report.note(format!("{} async method(s) remain", scanned.methods.len()));
                }
            }
            Err(e) => report.error_at(
                ErrorCategory::Syntax,
                format!("converted text does not parse: {e}"),
                e.line(),
            ),
        }

        for conversion in conversions {
            check_conversion(conversion, &mut report);
        }

        tracing::debug!(
            path = %result.path.display(),
            conversions = conversions.len(),
            errors = report.errors.len(),
            "post-validated"
        );
        report.finish(started)
    }
}

fn check_imports(imports: &ImportTable, converted_any: bool, report: &mut ValidationReport) {
    for entry in imports.iter() {
        if entry.module.trim().is_empty() {
            report.error(ErrorCategory::Import, "import with an empty module path");
            continue;
        }
        if entry.named.iter().any(|s| s.name.trim().is_empty()) {
            report.error(
                ErrorCategory::Import,
                format!("import from '{}' has an empty specifier", entry.module),
            );
        }
    }
    if converted_any && imports.module_for_binding("rxMethod").is_none() {
        report.error(ErrorCategory::Import, "rxMethod is used but never imported");
    }
}

fn check_conversion(conversion: &ConversionRecord, report: &mut ValidationReport) {
    let name = &conversion.method_name;
    if !conversion.body.contains("rxMethod") {
        report.error(
            ErrorCategory::PatternInvariant,
            format!("'{name}' was not converted to rxMethod"),
        );
    }
    if !ERROR_HANDLERS.iter().any(|h| conversion.body.contains(h)) {
        report.warning(
            ErrorCategory::PatternInvariant,
            format!("'{name}' has no error handling in its pipeline"),
        );
    }
    if let Some(wrapper) = &conversion.wrapper {
        if !PROMISE_BRIDGES.iter().any(|b| wrapper.contains(b)) {
            report.error(
                ErrorCategory::PatternInvariant,
                format!("wrapper for '{name}' does not return a promise of the pipeline"),
            );
        }
    }
}
