//! The migration run
//!
//! # Phases
//!
//! ```text
//! Discover → PreValidate → Backup → Convert → PostValidate → HandleFailures → Report
//! ```
//!
//! Each phase takes the [`RunContext`] by `&mut` and runs to completion before
//! the next starts. File I/O inside a phase is issued concurrently, one batch
//! of `max_parallel_files` at a time; parsing and code generation for a file
//! run between its read and its write without yielding.

use crate::backup::{create_backups, restore};
use crate::context::{PendingFile, RunContext};
use crate::discover::{Discovery, MigrationTarget};
use crate::error::MigrationError;
use crate::fs::{FileSystem, TokioFs};
use crate::report::{log_summary, persist};
use futures::future::join_all;
use rxmig_classifier::classify_with;
use rxmig_codegen::{assemble, AssemblerOptions, PlannedConversion};
use rxmig_core::{ErrorCategory, FileIssue, GenerationResult, MigrationConfig, MigrationReport};
use rxmig_scanner::scan_source;
use rxmig_validator::{ManifestReader, PostValidator, PreValidator, ProgramChecker, TypeChecker};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Failure ratio above which a run is called out in the log
pub const HIGH_FAILURE_RATIO: f64 = 0.5;

/// Runs migrations with one configuration
#[derive(Debug, Clone)]
pub struct Migrator {
    config: MigrationConfig,
    fs: Arc<dyn FileSystem>,
    discovery: Discovery,
    pre: PreValidator,
    post: PostValidator,
    program: ProgramChecker,
    assembler: AssemblerOptions,
}

impl Migrator {
    /// Create migrator working on the local disk
    ///
    /// # Errors
    /// If the configuration is invalid or a pattern does not compile
    pub fn new(config: MigrationConfig) -> Result<Self, MigrationError> {
        config.validate()?;
        Ok(Self {
            discovery: Discovery::from_config(&config)?,
            pre: PreValidator::from_config(&config),
            post: PostValidator::new(),
            program: ProgramChecker::from_config(&config.type_check),
            assembler: AssemblerOptions::from_config(&config),
            fs: Arc::new(TokioFs),
            config,
        })
    }

    /// Use another file system
    #[must_use]
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Use another manifest source for dependency checks
    #[must_use]
    pub fn with_manifest(mut self, manifest: Arc<dyn ManifestReader>) -> Self {
        self.pre = self.pre.with_manifest(manifest);
        self
    }

    /// Use another whole-program checker
    #[must_use]
    pub fn with_type_checker(mut self, checker: Arc<dyn TypeChecker>) -> Self {
        self.program = self.program.with_checker(checker);
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Run every phase over `target`
    ///
    /// A report is produced whenever the run completes, however many files
    /// failed.
    ///
    /// # Errors
    /// - `MigrationError::Discovery` if the target cannot be enumerated
    /// - `MigrationError::Write` if converted text cannot be written back;
    ///   every backup taken so far is restored first
    pub async fn run(&self, target: MigrationTarget) -> Result<MigrationReport, MigrationError> {
        let mut ctx = RunContext::new(target.root());
        tracing::info!(
            run_id = %ctx.run_id,
            root = %ctx.root.display(),
            preview = self.config.preview_only,
            "migration started"
        );

        let files = self.discover(&target, &mut ctx).await?;
        self.prevalidate(files, &mut ctx).await;
        self.backup(&mut ctx).await;
        if let Err(error) = self.convert(&mut ctx).await {
            tracing::error!(%error, backups = ctx.backups.len(), "conversion aborted, restoring backups");
            self.restore_all(&ctx).await;
            return Err(error);
        }
        self.postvalidate(&mut ctx).await;
        self.handle_failures(&mut ctx).await;
        Ok(self.report(ctx).await)
    }

    async fn discover(
        &self,
        target: &MigrationTarget,
        ctx: &mut RunContext,
    ) -> Result<Vec<PathBuf>, MigrationError> {
        let discovered = self.discovery.discover(self.fs.as_ref(), target).await?;
        ctx.stats.files_discovered = discovered.found;
        ctx.stats.files_excluded = discovered.excluded;
        Ok(discovered.files)
    }

    async fn prevalidate(&self, files: Vec<PathBuf>, ctx: &mut RunContext) {
        tracing::info!(files = files.len(), "pre-validating");
        for batch in files.chunks(self.config.max_parallel_files) {
            let probes = join_all(batch.iter().map(|path| self.fs.probe(path))).await;
            for (path, probe) in batch.iter().zip(probes) {
                let report = self.pre.validate_probe(path, &probe);
                if report.is_valid {
                    ctx.pending.push(PendingFile {
                        path: path.clone(),
                        validation: report,
                    });
                } else {
                    tracing::warn!(
                        path = %path.display(),
                        errors = report.errors.len(),
                        "rejected by pre-validation"
                    );
                    let mut result =
                        GenerationResult::unchanged(path.clone(), probe.text.unwrap_or_default());
                    result.attach_validation(report);
                    ctx.record_rejected(result);
                }
            }
        }
    }

    async fn backup(&self, ctx: &mut RunContext) {
        if self.config.preview_only || !self.config.create_backups {
            tracing::debug!("backups skipped");
            return;
        }
        let files: Vec<PathBuf> = ctx.pending.iter().map(|f| f.path.clone()).collect();
        tracing::info!(files = files.len(), "backing up");

        let mut failed = Vec::new();
        for batch in files.chunks(self.config.max_parallel_files) {
            let outcomes = create_backups(self.fs.as_ref(), batch, &self.config.backup_suffix).await;
            for (path, outcome) in outcomes {
                match outcome {
                    Ok(entry) => ctx.backups.record(entry),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "backup failed, file skipped");
                        failed.push((path, e));
                    }
                }
            }
        }

        for (path, e) in failed {
            ctx.pending.retain(|f| f.path != path);
            ctx.rejected.push(GenerationResult::failed(
                path,
                String::new(),
                FileIssue::new(ErrorCategory::FileAccess, format!("backup failed: {e}")),
            ));
        }
    }

    async fn convert(&self, ctx: &mut RunContext) -> Result<(), MigrationError> {
        let pending = std::mem::take(&mut ctx.pending);
        tracing::info!(files = pending.len(), batch = self.config.max_parallel_files, "converting");

        let mut batches = pending.chunks(self.config.max_parallel_files).peekable();
        while let Some(batch) = batches.next() {
            let outcomes = join_all(batch.iter().map(|file| self.convert_file(file))).await;

            let mut write_error = None;
            let mut batch_failed = false;
            for outcome in outcomes {
                match outcome {
                    Ok(result) => {
                        tracing::debug!(
                            path = %result.path.display(),
                            converted = result.converted_count,
                            skipped = result.skipped_count,
                            success = result.success,
                            "file converted"
                        );
                        batch_failed |= !result.success;
                        ctx.record_converted(result);
                    }
                    Err(e) => {
                        write_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = write_error {
                return Err(e);
            }
            if batch_failed && self.config.stop_on_first_error && batches.peek().is_some() {
                let remaining: usize = batches.map(<[PendingFile]>::len).sum();
                tracing::warn!(remaining, "stopping after first failed batch");
                ctx.stats.halted_early = true;
                break;
            }
        }
        Ok(())
    }

    async fn convert_file(&self, file: &PendingFile) -> Result<GenerationResult, MigrationError> {
        let path = &file.path;
        let mut result = match self.fs.read_to_string(path).await {
            Ok(original) => self.transform(path, &original),
            Err(e) => GenerationResult::failed(
                path.clone(),
                String::new(),
                FileIssue::new(ErrorCategory::FileAccess, format!("read failed: {e}")),
            ),
        };
        result.attach_validation(file.validation.clone());

        if result.is_modified() && !self.config.preview_only {
            self.fs
                .write(path, &result.converted_code)
                .await
                .map_err(|e| MigrationError::write(path, e))?;
        }
        Ok(result)
    }

    /// Scan, classify and assemble one file's text
    #[must_use]
    pub fn transform(&self, path: &Path, original: &str) -> GenerationResult {
        let scanned = match scan_source(path, original) {
            Ok(scanned) => scanned,
            Err(e) => {
                return GenerationResult::failed(
                    path,
                    original,
                    FileIssue::new(e.category(), e.to_string()),
                )
            }
        };

        let verdicts: Vec<_> = scanned
            .methods
            .iter()
            .map(|m| classify_with(m, &scanned.context, &self.config.thresholds))
            .collect();
        let plans: Vec<PlannedConversion<'_>> = scanned
            .methods
            .iter()
            .zip(&verdicts)
            .map(|(record, verdict)| PlannedConversion {
                record,
                label: verdict.label,
                confidence: verdict.confidence,
                manual_review: verdict.requires_manual_review,
            })
            .collect();
        let outcome = assemble(original, &plans, &scanned.context, &self.assembler);

        let mut result = GenerationResult::unchanged(path, original);
        result.converted_code = outcome.text;
        result.converted_count = outcome.conversions.len();
        result.skipped_count = scanned.methods.len().saturating_sub(result.converted_count);
        result.errors = outcome.failures;
        for (record, verdict) in scanned.methods.iter().zip(&verdicts) {
            result
                .warnings
                .extend(verdict.warnings.iter().map(|w| format!("{}: {w}", record.name())));
        }
        result.warnings.extend(outcome.warnings);
        result.import_changes = outcome.import_changes;
        result.conversions = outcome.conversions;
        result.manual_review = outcome.manual_review;
        result.refresh_success();
        result
    }

    async fn postvalidate(&self, ctx: &mut RunContext) {
        tracing::info!(files = ctx.converted.len(), "post-validating");
        for result in &mut ctx.converted {
            if result.is_modified() {
                let report = self.post.validate(result, &result.conversions);
                result.attach_validation(report);
            }
        }

        let written = ctx.converted.iter().any(GenerationResult::is_modified);
        if self.program.is_enabled() && self.config.preview_only {
            tracing::info!("program check skipped in preview");
        } else if self.program.is_enabled() && written {
            let outcome = self.program.run(&ctx.root).await;
            let dir = self.program.project_dir(&ctx.root).to_path_buf();
            for result in ctx.converted.iter_mut().filter(|r| r.is_modified()) {
                let mut report = outcome.for_file(&dir, &result.path);
                report.warnings.extend(outcome.report.warnings.iter().cloned());
                if !report.errors.is_empty() || !report.warnings.is_empty() {
                    result.attach_validation(report);
                }
            }
        }
        ctx.recount();
    }

    async fn handle_failures(&self, ctx: &mut RunContext) {
        if self.config.preview_only {
            tracing::debug!("preview: nothing to roll back");
            return;
        }
        let mut rolled_back = 0;
        for result in ctx.converted.iter_mut().filter(|r| !r.success && r.is_modified()) {
            let Some(entry) = ctx.backups.get(&result.path) else {
                tracing::warn!(path = %result.path.display(), "failed file has no backup, left as written");
                continue;
            };
            match restore(self.fs.as_ref(), entry).await {
                Ok(()) => {
                    rolled_back += 1;
                    result.warnings.push("restored from backup".to_string());
                }
                Err(e) => {
                    tracing::error!(path = %result.path.display(), error = %e, "restore failed");
                    result
                        .errors
                        .push(FileIssue::new(ErrorCategory::FileAccess, format!("restore failed: {e}")));
                }
            }
        }
        ctx.stats.files_rolled_back += rolled_back;

        let ratio = ctx.stats.failure_ratio();
        if ratio > HIGH_FAILURE_RATIO {
            tracing::warn!(
                failed = ctx.stats.files_failed,
                processed = ctx.stats.files_processed,
                "more than half of the processed files failed"
            );
        }
    }

    async fn restore_all(&self, ctx: &RunContext) {
        for entry in ctx.backups.iter() {
            if let Err(e) = restore(self.fs.as_ref(), entry).await {
                tracing::error!(path = %entry.original.display(), error = %e, "restore failed");
            }
        }
    }

    async fn report(&self, ctx: RunContext) -> MigrationReport {
        let report = ctx.into_report(self.config.clone());
        log_summary(&report);
        if let Some(path) = &self.config.report_output_path {
            if let Err(error) = persist(self.fs.as_ref(), &report, self.config.report_format, path).await {
                tracing::error!(%error, "report not persisted");
            }
        }
        report
    }
}
