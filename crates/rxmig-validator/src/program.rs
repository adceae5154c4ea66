//! Whole-program type check
//!
//! Runs an external checker (by default `npx tsc --noEmit`) over the project
//! after conversion. The check is bounded by a timeout; a check that cannot
//! finish or cannot start is reported as skipped, never as a failure.

use crate::error::ValidatorError;
use once_cell::sync::Lazy;
use regex::Regex;
use rxmig_core::{ErrorCategory, TypeCheckConfig, ValidationReport};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

static DIAGNOSTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)\): (?P<severity>error|warning|message) (?P<code>TS\d+): (?P<message>.*)$")
        .expect("diagnostic regex is valid")
});

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks the run
    Error,
    /// Reported, never blocks
    Warning,
    /// Informational
    Message,
}

/// One checker finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File, as the checker printed it
    pub file: Option<String>,
    /// 1-based line
    pub line: Option<usize>,
    /// Severity
    pub severity: Severity,
    /// Checker code, like `TS2322`
    pub code: Option<String>,
    /// Message
    pub message: String,
}

impl Diagnostic {
    /// Category by checker code
    ///
    /// `TS1xxx` are syntax errors; unresolved modules are dependency problems;
    /// missing or duplicate exports are import problems; the rest are treated
    /// as pattern invariants of the generated code.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self.code.as_deref() {
            Some(code) if code.starts_with("TS1") && code.len() == 6 => ErrorCategory::Syntax,
            Some("TS2307" | "TS2792") => ErrorCategory::Dependency,
            Some("TS2300" | "TS2305" | "TS2440" | "TS2614" | "TS2724") => ErrorCategory::Import,
            _ => ErrorCategory::PatternInvariant,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}: ")?;
        }
        if let Some(code) = &self.code {
            write!(f, "{code} ")?;
        }
        f.write_str(&self.message)
    }
}

/// Parse checker output, one diagnostic per matching line
#[must_use]
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|line| DIAGNOSTIC.captures(line.trim_end()))
        .map(|caps| Diagnostic {
            file: Some(caps["file"].to_string()),
            line: caps["line"].parse().ok(),
            severity: match &caps["severity"] {
                "error" => Severity::Error,
                "warning" => Severity::Warning,
                _ => Severity::Message,
            },
            code: Some(caps["code"].to_string()),
            message: caps["message"].to_string(),
        })
        .collect()
}

/// External type checker
#[async_trait::async_trait]
pub trait TypeChecker: Send + Sync + Debug {
    /// Check the project rooted at `project_dir`
    ///
    /// # Errors
    /// If the checker cannot run or produces nothing usable
    async fn check(&self, project_dir: &Path) -> Result<Vec<Diagnostic>, ValidatorError>;
}

/// Runs a `tsc`-compatible command
#[derive(Debug, Clone)]
pub struct TscChecker {
    command: Vec<String>,
}

impl TscChecker {
    /// Create checker running `command`
    #[must_use]
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Default for TscChecker {
    fn default() -> Self {
        Self::new(TypeCheckConfig::default().command)
    }
}

#[async_trait::async_trait]
impl TypeChecker for TscChecker {
    async fn check(&self, project_dir: &Path) -> Result<Vec<Diagnostic>, ValidatorError> {
        let (program, args) = self.command.split_first().ok_or(ValidatorError::EmptyCommand)?;
        let rendered = self.command.join(" ");
        tracing::debug!(command = %rendered, dir = %project_dir.display(), "running type checker");

        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ValidatorError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics = parse_diagnostics(&stdout);
        diagnostics.extend(parse_diagnostics(&stderr));

        if !output.status.success() && diagnostics.is_empty() {
            let detail = stderr
                .lines()
                .chain(stdout.lines())
                .find(|l| !l.trim().is_empty())
                .map_or_else(|| output.status.to_string(), str::to_string);
            return Err(ValidatorError::CheckerFailed {
                command: rendered,
                detail,
            });
        }
        Ok(diagnostics)
    }
}

/// Whole-program check with a time budget
#[derive(Debug, Clone)]
pub struct ProgramChecker {
    checker: Arc<dyn TypeChecker>,
    enabled: bool,
    timeout: Duration,
    project_dir: Option<PathBuf>,
}

impl ProgramChecker {
    /// Create from configuration, running the configured command
    #[must_use]
    pub fn from_config(config: &TypeCheckConfig) -> Self {
        Self {
            checker: Arc::new(TscChecker::new(config.command.clone())),
            enabled: config.enabled,
            timeout: Duration::from_secs(config.timeout_secs),
            project_dir: config.project_dir.clone(),
        }
    }

    /// Replace the checker
    #[must_use]
    pub fn with_checker(mut self, checker: Arc<dyn TypeChecker>) -> Self {
        self.checker = checker;
        self
    }

    /// Replace the time budget
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the check runs at all
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Directory the checker runs in, given the run root
    #[must_use]
    pub fn project_dir<'a>(&'a self, root: &'a Path) -> &'a Path {
        self.project_dir.as_deref().unwrap_or(root)
    }

    /// Run the check for the project around `root`
    pub async fn validate(&self, root: &Path) -> ValidationReport {
        self.run(root).await.report
    }

    /// Run the check, keeping the raw diagnostics
    pub async fn run(&self, root: &Path) -> ProgramOutcome {
        let started = Instant::now();
        let mut report = ValidationReport::new();
        if !self.enabled {
            report.note("program check disabled");
            return ProgramOutcome {
                report: report.finish(started),
                diagnostics: Vec::new(),
            };
        }

        let dir = self.project_dir(root);
        let diagnostics = match tokio::time::timeout(self.timeout, self.checker.check(dir)).await {
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "program check timed out");
                report.warning(
                    ErrorCategory::Configuration,
                    format!("program check skipped: no result within {}s", self.timeout.as_secs_f64()),
                );
                Vec::new()
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "program check could not run");
                report.warning(e.category(), format!("program check skipped: {e}"));
                Vec::new()
            }
            Ok(Ok(diagnostics)) => {
                record(&diagnostics, &mut report);
                let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
                report.note(format!("program check finished with {errors} error(s)"));
                diagnostics
            }
        };
        ProgramOutcome {
            report: report.finish(started),
            diagnostics,
        }
    }
}

/// Result of one program check
#[derive(Debug, Clone)]
pub struct ProgramOutcome {
    /// Every diagnostic folded into a report
    pub report: ValidationReport,
    /// Diagnostics as the checker printed them
    pub diagnostics: Vec<Diagnostic>,
}

impl ProgramOutcome {
    /// Report holding only the diagnostics for `file`
    ///
    /// Checker paths are taken relative to `root` unless absolute.
    #[must_use]
    pub fn for_file(&self, root: &Path, file: &Path) -> ValidationReport {
        let started = Instant::now();
        let mut report = ValidationReport::new();
        let matching: Vec<Diagnostic> = self
            .diagnostics
            .iter()
            .filter(|d| d.file.as_deref().is_some_and(|f| root.join(f) == file || file.ends_with(f)))
            .cloned()
            .collect();
        record(&matching, &mut report);
        report.finish(started)
    }
}

fn record(diagnostics: &[Diagnostic], report: &mut ValidationReport) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Error => {
                report.error_at(diagnostic.category(), diagnostic.to_string(), diagnostic.line);
            }
            Severity::Warning => report.warning(diagnostic.category(), diagnostic.to_string()),
            Severity::Message => report.note(diagnostic.to_string()),
        }
    }
}
