//! Code Assembler
//!
//! Turns a file plus its planned conversions into transformed text:
//!
//! 1. Per method: stale-range and layout checks, generation, layout
//! 2. Replace method ranges, highest start first (one edit per method,
//!    wrapper included)
//! 3. When anything converted: reconcile imports, write the block over the
//!    first run of import lines and drop the other import lines
//! 4. Balanced-delimiter check over the result
//!
//! Per-method failures leave that method untouched. A failed final check
//! returns the original text unchanged.

use crate::error::CodegenError;
use crate::imports::{self, reconcile, RenderOptions};
use crate::render::{render, LayoutOptions, RenderedMethod};
use crate::splice::{splice, split_lines, LineEdit};
use crate::templates::{generate, GeneratedMethod, TemplateOptions, RXJS};
use regex::Regex;
use rxmig_core::{
    ConversionRecord, FileContext, FileIssue, ImportChangeSummary, ImportEntry, MethodRecord,
    MigrationConfig, PatternLabel,
};

/// Leading keywords a convertible declaration line may start with
const DECLARATION_STARTS: [&str; 6] = [
    "async",
    "public",
    "private",
    "protected",
    "static",
    "override",
];

/// One method scheduled for conversion
#[derive(Debug, Clone, Copy)]
pub struct PlannedConversion<'a> {
    /// Scanned record
    pub record: &'a MethodRecord,
    /// Template to use
    pub label: PatternLabel,
    /// Classifier confidence
    pub confidence: u8,
    /// Classifier asked for a human pass
    pub manual_review: bool,
}

/// Assembler settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssemblerOptions {
    /// Wrapper and provenance switches
    pub layout: LayoutOptions,
    /// Template settings
    pub templates: TemplateOptions,
    /// Import block layout
    pub imports: RenderOptions,
}

impl AssemblerOptions {
    /// Derive from run configuration
    #[must_use]
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self {
            layout: LayoutOptions {
                compatibility: config.preserve_caller_compatibility,
                provenance: config.add_provenance_comments,
            },
            templates: TemplateOptions {
                helper_module: config.helper_module.clone(),
            },
            imports: RenderOptions {
                sort: config.sort_imports,
                platform_prefixes: config.platform_prefixes.clone(),
            },
        }
    }
}

/// Everything the assembler produced for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyOutcome {
    /// Transformed text (the original when nothing converted)
    pub text: String,
    /// Methods that were replaced
    pub conversions: Vec<ConversionRecord>,
    /// Methods or files that could not be converted
    pub failures: Vec<FileIssue>,
    /// Non-blocking notes
    pub warnings: Vec<String>,
    /// Import reconciliation summary
    pub import_changes: ImportChangeSummary,
    /// Converted methods that need a human pass
    pub manual_review: Vec<String>,
    /// `text` differs from the input
    pub changed: bool,
}

/// A method that survived per-method checks
#[derive(Debug)]
struct Candidate<'a> {
    plan: PlannedConversion<'a>,
    generated: GeneratedMethod,
    rendered: RenderedMethod,
}

/// Assemble the transformed text for one file
#[must_use]
pub fn assemble(
    original: &str,
    plans: &[PlannedConversion<'_>],
    context: &FileContext,
    options: &AssemblerOptions,
) -> AssemblyOutcome {
    let mut outcome = AssemblyOutcome {
        text: original.to_string(),
        ..AssemblyOutcome::default()
    };
    if plans.is_empty() {
        return outcome;
    }

    let lines = split_lines(original);
    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    for plan in plans {
        match prepare(&lines, plan, context, options) {
            Ok(candidate) => candidates.push(candidate),
            Err(err) => {
                tracing::warn!(method = plan.record.name(), error = %err, "method not converted");
                outcome.failures.push(err.to_issue(Some(plan.record.name())));
            }
        }
    }

    // First pass only decides which method edits can coexist
    let method_edits: Vec<LineEdit> = candidates.iter().map(method_edit).collect();
    let trial = splice(original, &method_edits);
    let mut accepted = Vec::new();
    for (candidate, placement) in candidates.into_iter().zip(trial.placements) {
        match placement {
            Ok(_) => accepted.push(candidate),
            Err(err) => {
                let name = candidate.plan.record.name();
                tracing::warn!(method = name, error = %err, "edit rejected");
                outcome.failures.push(err.to_issue(Some(name)));
            }
        }
    }
    if accepted.is_empty() {
        return outcome;
    }

    let mut required: Vec<ImportEntry> = accepted
        .iter()
        .flat_map(|c| c.generated.imports.iter().cloned())
        .collect();
    if options.layout.compatibility {
        required.push(ImportEntry::named(RXJS, ["firstValueFrom", "of"]));
    }
    let reconciled = reconcile(&context.imports, &required);
    apply_renames(&mut accepted, &required, &reconciled);

    let crlf = lines.first().is_some_and(|l| l.ends_with('\r'));
    let mut edits: Vec<LineEdit> = accepted.iter().map(method_edit).collect();
    if reconciled.changed() {
        if context.import_lines_shared {
            let err = CodegenError::ImportLayout(
                "an import statement shares a line with other code".to_string(),
            );
            tracing::warn!(error = %err, "import block not rewritten");
            outcome.failures.push(err.to_issue(None));
            return outcome;
        }
        let mut block = imports::render_imports(&reconciled.merged, &options.imports);
        match context.import_runs.split_first() {
            // Later runs are dropped line by line; code between runs stays
            Some((&(start, end), rest)) => {
                edits.push(LineEdit::replace_lines(start, end, block));
                edits.extend(
                    rest.iter()
                        .map(|&(start, end)| LineEdit::replace_lines(start, end, Vec::new())),
                );
            }
            None => {
                block.push(String::new());
                edits.push(LineEdit::insert(0, block));
            }
        }
    }
    if crlf {
        for edit in &mut edits {
            for line in &mut edit.lines {
                line.push('\r');
            }
        }
    }

    let spliced = splice(original, &edits);
    if let Some(Err(err)) = spliced.placements[accepted.len()..].iter().find(|p| p.is_err()) {
        tracing::warn!(error = %err, "import block not rewritten");
        outcome.failures.push(err.to_issue(None));
        return outcome;
    }
    if let Err(imbalance) = rxmig_scanner::check_balance(&spliced.text) {
        let err = CodegenError::Unbalanced(imbalance.to_string());
        tracing::warn!(error = %err, "assembled text rejected");
        outcome.failures.push(err.to_issue(None));
        return outcome;
    }

    for candidate in accepted {
        let name = candidate.plan.record.name().to_string();
        outcome
            .warnings
            .extend(candidate.generated.notes.iter().map(|n| format!("{name}: {n}")));
        if candidate.plan.manual_review || candidate.generated.review {
            outcome.manual_review.push(name.clone());
        }
        tracing::debug!(
            method = %name,
            pattern = %candidate.generated.label,
            confidence = candidate.plan.confidence,
            "method converted"
        );
        outcome.conversions.push(ConversionRecord {
            method_name: name,
            pattern: candidate.generated.label,
            body: candidate.rendered.body,
            wrapper: candidate.rendered.wrapper,
            required_imports: candidate.generated.imports,
            confidence: candidate.plan.confidence,
        });
    }
    outcome.warnings.extend(reconciled.warnings.iter().cloned());
    outcome.import_changes = ImportChangeSummary {
        added: reconciled.added,
        modified: reconciled.modified,
        conflicts: reconciled.conflicts,
    };
    outcome.changed = spliced.text != original;
    outcome.text = spliced.text;
    outcome
}

fn prepare<'a>(
    lines: &[&str],
    plan: &PlannedConversion<'a>,
    context: &FileContext,
    options: &AssemblerOptions,
) -> Result<Candidate<'a>, CodegenError> {
    let record = plan.record;
    let (start, end) = (record.start_line(), record.end_line());
    let stale = || CodegenError::StaleRange {
        method: record.name().to_string(),
        start,
        end,
    };
    let span = lines.get(start.saturating_sub(1)..end).ok_or_else(stale)?;
    if start == 0 || span.join("\n") != record.source() {
        return Err(stale());
    }

    let first = span[0].trim_start();
    let starts_ok = DECLARATION_STARTS.iter().any(|kw| {
        first
            .strip_prefix(kw)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    });
    if !starts_ok {
        return Err(CodegenError::UnsupportedLayout {
            method: record.name().to_string(),
            detail: format!("line {start} does not start with the declaration"),
        });
    }
    let last = span[span.len() - 1].trim_end_matches('\r');
    let suffix = last
        .rfind('}')
        .map(|idx| last[idx + 1..].trim_end())
        .filter(|s| suffix_allowed(s))
        .ok_or_else(|| CodegenError::UnsupportedLayout {
            method: record.name().to_string(),
            detail: format!("line {end} continues past the closing brace"),
        })?;

    let generated = generate(record, plan.label, context, &options.templates);
    let rendered = render(record, &generated, plan.confidence, suffix, options.layout);
    Ok(Candidate {
        plan: *plan,
        generated,
        rendered,
    })
}

fn suffix_allowed(suffix: &str) -> bool {
    let trimmed = suffix.trim();
    matches!(trimmed, "" | "," | ";")
        || trimmed.starts_with("//")
        || trimmed
            .strip_prefix(',')
            .is_some_and(|rest| rest.trim_start().starts_with("//"))
}

fn method_edit(candidate: &Candidate<'_>) -> LineEdit {
    let record = candidate.plan.record;
    LineEdit::replace_lines(
        record.start_line(),
        record.end_line(),
        candidate.rendered.lines.clone(),
    )
}

/// Point generated code at the aliases the reconciler chose
fn apply_renames(
    accepted: &mut [Candidate<'_>],
    required: &[ImportEntry],
    reconciled: &imports::ReconcileOutcome,
) {
    let mut renames: Vec<(String, String)> = Vec::new();
    for entry in required {
        for spec in &entry.named {
            let bound = reconciled.binding_for(&entry.module, &spec.name);
            if bound != spec.local_name() && !renames.iter().any(|(from, _)| *from == spec.name) {
                renames.push((spec.name.clone(), bound));
            }
        }
    }
    if renames.is_empty() {
        return;
    }

    let patterns: Vec<(Regex, String)> = renames
        .into_iter()
        .filter_map(|(from, to)| {
            let re = Regex::new(&format!(r"(^|[^.\w$]){}\b", regex::escape(&from))).ok()?;
            Some((re, format!("${{1}}{to}")))
        })
        .collect();
    let rewrite = |line: &str| -> String {
        if line.trim_start().starts_with("//") {
            return line.to_string();
        }
        patterns
            .iter()
            .fold(line.to_string(), |acc, (re, to)| re.replace_all(&acc, to.as_str()).into_owned())
    };

    for candidate in accepted {
        let rendered = &mut candidate.rendered;
        rendered.lines = rendered.lines.iter().map(|l| rewrite(l)).collect();
        rendered.body = rendered.body.split('\n').map(rewrite).collect::<Vec<_>>().join("\n");
        rendered.wrapper = rendered
            .wrapper
            .as_ref()
            .map(|w| w.split('\n').map(rewrite).collect::<Vec<_>>().join("\n"));
    }
}
