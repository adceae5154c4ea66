//! Run-level report

use super::method::PatternLabel;
use super::results::GenerationResult;
use crate::config::MigrationConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use ulid::Ulid;

/// Aggregate counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStats {
    /// Files found before exclusion
    pub files_discovered: usize,
    /// Files removed by exclusion patterns
    pub files_excluded: usize,
    /// Files rejected by pre-conversion validation
    pub files_failed_prevalidation: usize,
    /// Files that went through conversion
    pub files_processed: usize,
    /// Processed files whose result is successful
    pub files_succeeded: usize,
    /// Processed files whose result is unsuccessful
    pub files_failed: usize,
    /// Files restored from backup
    pub files_rolled_back: usize,
    /// Candidate methods found
    pub methods_found: usize,
    /// Methods replaced
    pub methods_converted: usize,
    /// Methods left untouched
    pub methods_skipped: usize,
    /// Methods flagged for manual review
    pub methods_manual_review: usize,
    /// Conversions per pattern
    pub by_pattern: BTreeMap<PatternLabel, usize>,
    /// Convert phase stopped before all batches ran
    pub halted_early: bool,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl MigrationStats {
    /// Fold one processed file into the counters
    pub fn record_file(&mut self, result: &GenerationResult) {
        self.files_processed += 1;
        if result.success {
            self.files_succeeded += 1;
        } else {
            self.files_failed += 1;
        }
        self.methods_found += result.converted_count + result.skipped_count;
        self.methods_converted += result.converted_count;
        self.methods_skipped += result.skipped_count;
        self.methods_manual_review += result.manual_review.len();
        for conversion in &result.conversions {
            *self.by_pattern.entry(conversion.pattern).or_default() += 1;
        }
    }

    /// Fraction of processed files that failed
    #[must_use]
    pub fn failure_ratio(&self) -> f64 {
        if self.files_processed == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.files_failed as f64 / self.files_processed as f64;
        ratio
    }
}

/// A method a human should look at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualReviewItem {
    /// File
    pub file: PathBuf,
    /// Method
    pub method: String,
    /// Pattern chosen
    pub pattern: PatternLabel,
    /// Confidence of the choice
    pub confidence: u8,
}

/// Headline outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    /// Every file result is successful
    pub success: bool,
    /// Files with at least one error
    pub files_with_errors: Vec<PathBuf>,
    /// Files with at least one warning
    pub files_with_warnings: Vec<PathBuf>,
    /// Methods flagged for manual review
    pub manual_review: Vec<ManualReviewItem>,
}

/// Everything a run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Run identifier
    pub run_id: Ulid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub finished_at: DateTime<Utc>,
    /// Configuration used
    pub config: MigrationConfig,
    /// Per-file results
    pub files: Vec<GenerationResult>,
    /// Aggregate counters
    pub stats: MigrationStats,
    /// Headline outcome
    pub summary: MigrationSummary,
}

impl MigrationReport {
    /// Build report and derive its summary from file results
    #[must_use]
    pub fn new(
        run_id: Ulid,
        started_at: DateTime<Utc>,
        config: MigrationConfig,
        files: Vec<GenerationResult>,
        stats: MigrationStats,
    ) -> Self {
        let summary = summarize(&files);
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            config,
            files,
            stats,
            summary,
        }
    }

    /// Whether every processed file succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.summary.success
    }
}

fn summarize(files: &[GenerationResult]) -> MigrationSummary {
    let mut summary = MigrationSummary {
        success: files.iter().all(|f| f.success),
        ..MigrationSummary::default()
    };

    for file in files {
        let has_validation_errors = file.validation.as_ref().is_some_and(|v| !v.errors.is_empty());
        if !file.errors.is_empty() || has_validation_errors {
            summary.files_with_errors.push(file.path.clone());
        }
        let has_validation_warnings =
            file.validation.as_ref().is_some_and(|v| !v.warnings.is_empty());
        if !file.warnings.is_empty() || has_validation_warnings {
            summary.files_with_warnings.push(file.path.clone());
        }
        for method in &file.manual_review {
            if let Some(conversion) = file.conversions.iter().find(|c| &c.method_name == method) {
                summary.manual_review.push(ManualReviewItem {
                    file: file.path.clone(),
                    method: method.clone(),
                    pattern: conversion.pattern,
                    confidence: conversion.confidence,
                });
            }
        }
    }

    summary
}
