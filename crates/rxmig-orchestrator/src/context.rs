//! Per-run state threaded through the phases

use crate::backup::BackupMap;
use chrono::{DateTime, Utc};
use rxmig_core::{
    GenerationResult, MigrationConfig, MigrationReport, MigrationStats, ValidationReport,
};
use std::path::PathBuf;
use std::time::Instant;
use ulid::Ulid;

/// A file that passed pre-validation
#[derive(Debug, Clone)]
pub struct PendingFile {
    /// Path
    pub path: PathBuf,
    /// Pre-validation report, carried into the file's result
    pub validation: ValidationReport,
}

/// Mutable state of one run
///
/// Phases receive it by `&mut`; only whole-file outcomes are folded in.
#[derive(Debug)]
pub struct RunContext {
    /// Run identifier
    pub run_id: Ulid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Project root
    pub root: PathBuf,
    /// Files waiting for conversion
    pub pending: Vec<PendingFile>,
    /// Files that went through conversion, in completion order
    pub converted: Vec<GenerationResult>,
    /// Files rejected before conversion
    pub rejected: Vec<GenerationResult>,
    /// Backups taken so far
    pub backups: BackupMap,
    /// Counters
    pub stats: MigrationStats,
    started: Instant,
}

impl RunContext {
    /// Create context for a run rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            run_id: Ulid::new(),
            started_at: Utc::now(),
            root: root.into(),
            pending: Vec::new(),
            converted: Vec::new(),
            rejected: Vec::new(),
            backups: BackupMap::new(),
            stats: MigrationStats::default(),
            started: Instant::now(),
        }
    }

    /// Fold a converted file into results and counters
    pub fn record_converted(&mut self, result: GenerationResult) {
        self.stats.record_file(&result);
        self.converted.push(result);
    }

    /// Fold a rejected file into results and counters
    pub fn record_rejected(&mut self, result: GenerationResult) {
        self.stats.files_failed_prevalidation += 1;
        self.rejected.push(result);
    }

    /// Recount file and method counters from the converted results
    ///
    /// Post-validation can turn a successful file into a failed one.
    pub fn recount(&mut self) {
        let previous = std::mem::take(&mut self.stats);
        let mut stats = MigrationStats {
            files_discovered: previous.files_discovered,
            files_excluded: previous.files_excluded,
            files_failed_prevalidation: previous.files_failed_prevalidation,
            files_rolled_back: previous.files_rolled_back,
            halted_early: previous.halted_early,
            ..MigrationStats::default()
        };
        for result in &self.converted {
            stats.record_file(result);
        }
        self.stats = stats;
    }

    /// Milliseconds since the run started
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Close the run into a report: rejected files first, then converted files
    #[must_use]
    pub fn into_report(mut self, config: MigrationConfig) -> MigrationReport {
        self.stats.duration_ms = self.elapsed_ms();
        let mut files = self.rejected;
        files.extend(self.converted);
        MigrationReport::new(self.run_id, self.started_at, config, files, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxmig_core::{ErrorCategory, FileIssue};

    #[test]
    fn recount_follows_validation() {
        let mut ctx = RunContext::new("/p");
        ctx.stats.files_discovered = 2;
        let mut result = GenerationResult::unchanged("/p/a.ts", "a");
        result.converted_code = "b".into();
        result.converted_count = 1;
        ctx.record_converted(result);
        ctx.record_rejected(GenerationResult::failed(
            "/p/b.ts",
            "",
            FileIssue::new(ErrorCategory::Syntax, "bad"),
        ));
        assert_eq!(ctx.stats.files_succeeded, 1);

        let mut report = ValidationReport::new();
        report.error(ErrorCategory::PatternInvariant, "no rxMethod");
        ctx.converted[0].attach_validation(report);
        ctx.recount();

        assert_eq!(ctx.stats.files_discovered, 2);
        assert_eq!(ctx.stats.files_failed_prevalidation, 1);
        assert_eq!(ctx.stats.files_processed, 1);
        assert_eq!(ctx.stats.files_succeeded, 0);
        assert_eq!(ctx.stats.files_failed, 1);
        assert_eq!(ctx.stats.methods_converted, 1);

        let report = ctx.into_report(MigrationConfig::default());
        assert_eq!(report.files.len(), 2);
        assert!(!report.is_success());
    }
}
