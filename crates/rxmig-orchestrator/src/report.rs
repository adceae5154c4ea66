//! Report rendering and persistence
//!
//! Three formats, one per [`ReportFormat`]:
//! - structured text: sectioned plain text for terminals and logs
//! - JSON: the full report, pretty-printed
//! - rendered document: Markdown built here, rendered to HTML

use crate::error::MigrationError;
use crate::fs::FileSystem;
use pulldown_cmark::{html, Options, Parser};
use rxmig_core::{GenerationResult, MigrationReport, ReportFormat};
use std::fmt;
use std::path::Path;

/// Render a report in some format
pub trait RenderReport {
    /// Render `report`
    ///
    /// # Errors
    /// `MigrationError::Render` if serialization fails
    fn render(&self, report: &MigrationReport) -> Result<String, MigrationError>;
}

impl RenderReport for ReportFormat {
    fn render(&self, report: &MigrationReport) -> Result<String, MigrationError> {
        match self {
            ReportFormat::StructuredText => Ok(render_text(report)),
            ReportFormat::Json => serde_json::to_string_pretty(report)
                .map_err(|e| MigrationError::Render(e.to_string())),
            ReportFormat::RenderedDocument => Ok(render_html(report)),
        }
    }
}

fn status(success: bool) -> &'static str {
    if success {
        "SUCCESS"
    } else {
        "FAILED"
    }
}

fn mode(report: &MigrationReport) -> &'static str {
    if report.config.preview_only {
        "preview"
    } else {
        "write"
    }
}

fn counters(report: &MigrationReport) -> Vec<(&'static str, String)> {
    let s = &report.stats;
    vec![
        ("files discovered", s.files_discovered.to_string()),
        ("files excluded", s.files_excluded.to_string()),
        ("failed pre-validation", s.files_failed_prevalidation.to_string()),
        ("files processed", s.files_processed.to_string()),
        ("files succeeded", s.files_succeeded.to_string()),
        ("files failed", s.files_failed.to_string()),
        ("files rolled back", s.files_rolled_back.to_string()),
        ("methods found", s.methods_found.to_string()),
        ("methods converted", s.methods_converted.to_string()),
        ("methods skipped", s.methods_skipped.to_string()),
        ("manual review", s.methods_manual_review.to_string()),
        ("halted early", s.halted_early.to_string()),
        ("duration (ms)", s.duration_ms.to_string()),
    ]
}

fn file_messages(file: &GenerationResult) -> (Vec<String>, Vec<String>) {
    let mut errors: Vec<String> = file.errors.iter().map(ToString::to_string).collect();
    let mut warnings = file.warnings.clone();
    if let Some(validation) = &file.validation {
        errors.extend(validation.errors.iter().map(ToString::to_string));
        warnings.extend(validation.warnings.iter().map(ToString::to_string));
    }
    (errors, warnings)
}

/// Sectioned plain text
#[must_use]
pub fn render_text(report: &MigrationReport) -> String {
    TextReport(report).to_string()
}

/// Markdown source of the rendered document
#[must_use]
pub fn render_markdown(report: &MigrationReport) -> String {
    MarkdownReport(report).to_string()
}

struct TextReport<'a>(&'a MigrationReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(out, "rxmig migration report")?;
        writeln!(out, "======================")?;
        writeln!(out, "run:      {}", report.run_id)?;
        writeln!(out, "started:  {}", report.started_at.to_rfc3339())?;
        writeln!(out, "finished: {}", report.finished_at.to_rfc3339())?;
        writeln!(out, "mode:     {}", mode(report))?;
        writeln!(out, "result:   {}", status(report.summary.success))?;

        writeln!(out, "\nStatistics\n----------")?;
        for (label, value) in counters(report) {
            writeln!(out, "{label:<24}{value}")?;
        }
        if !report.stats.by_pattern.is_empty() {
            writeln!(out, "\nBy pattern\n----------")?;
            for (pattern, count) in &report.stats.by_pattern {
                writeln!(out, "{:<24}{count}", pattern.to_string())?;
            }
        }

        writeln!(out, "\nFiles\n-----")?;
        for file in &report.files {
            writeln!(
                out,
                "[{}] {} (converted {}, skipped {})",
                if file.success { "ok" } else { "failed" },
                file.path.display(),
                file.converted_count,
                file.skipped_count
            )?;
            let (errors, warnings) = file_messages(file);
            for error in errors {
                writeln!(out, "    error: {error}")?;
            }
            for warning in warnings {
                writeln!(out, "    warning: {warning}")?;
            }
        }

        if !report.summary.manual_review.is_empty() {
            writeln!(out, "\nManual review\n-------------")?;
            for item in &report.summary.manual_review {
                writeln!(
                    out,
                    "{} :: {} ({}, {}%)",
                    item.file.display(),
                    item.method,
                    item.pattern,
                    item.confidence
                )?;
            }
        }
        Ok(())
    }
}

struct MarkdownReport<'a>(&'a MigrationReport);

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, md: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(md, "# rxmig migration report\n")?;
        writeln!(
            md,
            "Run `{}` ({} mode) finished **{}** at {}.\n",
            report.run_id,
            mode(report),
            status(report.summary.success),
            report.finished_at.to_rfc3339()
        )?;

        writeln!(md, "## Statistics\n\n| Counter | Value |\n|---|---|")?;
        for (label, value) in counters(report) {
            writeln!(md, "| {label} | {value} |")?;
        }
        for (pattern, count) in &report.stats.by_pattern {
            writeln!(md, "| pattern `{pattern}` | {count} |")?;
        }

        writeln!(md, "\n## Files\n")?;
        for file in &report.files {
            writeln!(
                md,
                "### {} `{}`\n\nConverted {}, skipped {}.\n",
                if file.success { "✔" } else { "✘" },
                file.path.display(),
                file.converted_count,
                file.skipped_count
            )?;
            let (errors, warnings) = file_messages(file);
            for error in errors {
                writeln!(md, "- **error**: {}", escape(&error))?;
            }
            for warning in warnings {
                writeln!(md, "- warning: {}", escape(&warning))?;
            }
            writeln!(md)?;
        }

        if !report.summary.manual_review.is_empty() {
            writeln!(
                md,
                "## Manual review\n\n| File | Method | Pattern | Confidence |\n|---|---|---|---|"
            )?;
            for item in &report.summary.manual_review {
                writeln!(
                    md,
                    "| `{}` | `{}` | {} | {}% |",
                    item.file.display(),
                    item.method,
                    item.pattern,
                    item.confidence
                )?;
            }
        }
        Ok(())
    }
}

/// Rendered document as a standalone HTML page
#[must_use]
pub fn render_html(report: &MigrationReport) -> String {
    let markdown = render_markdown(report);
    let parser = Parser::new_ext(&markdown, Options::ENABLE_TABLES);
    let mut body = String::new();
    html::push_html(&mut body, parser);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>rxmig report {}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        report.run_id
    )
}

fn escape(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;").replace('|', "\\|")
}

/// Render and write a report
///
/// # Errors
/// If rendering or writing fails
pub async fn persist(
    fs: &dyn FileSystem,
    report: &MigrationReport,
    format: ReportFormat,
    path: &Path,
) -> Result<(), MigrationError> {
    let text = format.render(report)?;
    fs.write(path, &text).await.map_err(|source| MigrationError::Report {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), ?format, "report written");
    Ok(())
}

/// Log the headline numbers
pub fn log_summary(report: &MigrationReport) {
    let s = &report.stats;
    tracing::info!(
        run_id = %report.run_id,
        success = report.summary.success,
        processed = s.files_processed,
        succeeded = s.files_succeeded,
        failed = s.files_failed,
        rejected = s.files_failed_prevalidation,
        rolled_back = s.files_rolled_back,
        converted = s.methods_converted,
        manual_review = s.methods_manual_review,
        duration_ms = s.duration_ms,
        "migration finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rxmig_core::{
        ConversionRecord, ErrorCategory, FileIssue, MigrationConfig, MigrationStats, PatternLabel,
    };
    use ulid::Ulid;

    fn sample() -> MigrationReport {
        let mut ok = GenerationResult::unchanged("/p/a.store.ts", "x");
        ok.converted_code = "y".into();
        ok.converted_count = 1;
        ok.warnings.push("load: unbounded fan-out".into());
        ok.conversions.push(ConversionRecord {
            method_name: "load".into(),
            pattern: PatternLabel::CustomFallback,
            body: String::new(),
            wrapper: None,
            required_imports: Vec::new(),
            confidence: 40,
        });
        ok.manual_review.push("load".into());
        let failed = GenerationResult::failed(
            "/p/b.store.ts",
            "",
            FileIssue::new(ErrorCategory::Syntax, "missing '}'"),
        );
        let mut stats = MigrationStats::default();
        stats.record_file(&ok);
        MigrationReport::new(Ulid::new(), Utc::now(), MigrationConfig::default(), vec![ok, failed], stats)
    }

    #[test]
    fn text_has_sections() {
        let text = render_text(&sample());
        assert!(text.contains("result:   FAILED"));
        assert!(text.contains("[ok] /p/a.store.ts (converted 1, skipped 0)"));
        assert!(text.contains("    error: [syntax] missing '}'"));
        assert!(text.contains("Manual review"));
        assert!(text.contains("/p/a.store.ts :: load (custom-fallback, 40%)"));
    }

    #[test]
    fn markdown_lists_files_and_review() {
        let md = render_markdown(&sample());
        assert!(md.starts_with("# rxmig migration report\n\n"));
        assert!(md.contains("| methods converted | 1 |"));
        assert!(md.contains("### ✘ `/p/b.store.ts`"));
        assert!(md.contains("- **error**: [syntax] missing '}'"));
        assert!(md.contains("| `/p/a.store.ts` | `load` | custom-fallback | 40% |"));
    }

    #[test]
    fn json_round_trips() {
        let report = sample();
        let json = ReportFormat::Json.render(&report).unwrap();
        let back: MigrationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.files.len(), 2);
        assert_eq!(back.run_id, report.run_id);
    }

    #[test]
    fn html_renders_tables() {
        let html = ReportFormat::RenderedDocument.render(&sample()).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>rxmig migration report</h1>"));
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>methods converted</td>"));
    }
}
