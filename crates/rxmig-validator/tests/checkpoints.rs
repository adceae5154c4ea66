//! Validation checkpoints against real files and converted output

use pretty_assertions::assert_eq;
use rxmig_classifier::classify;
use rxmig_codegen::{assemble, AssemblerOptions, PlannedConversion};
use rxmig_core::{ErrorCategory, GenerationResult, TypeCheckConfig};
use rxmig_scanner::scan_source;
use rxmig_test_utils::{
    TestProject, BULK_STORE, PACKAGE_JSON_MISSING_OPERATORS, SIMPLE_LOAD_STORE, UNBALANCED_STORE,
};
use rxmig_validator::{
    Diagnostic, PostValidator, PreValidator, ProgramChecker, TypeChecker, ValidatorError,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Checker that never answers in time
#[derive(Debug)]
struct SlowChecker;

#[async_trait::async_trait]
impl TypeChecker for SlowChecker {
    async fn check(&self, _project_dir: &Path) -> Result<Vec<Diagnostic>, ValidatorError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn pre_validation_on_disk() {
    let project = TestProject::with_manifest();
    let good = project.write("src/app/projects.store.ts", SIMPLE_LOAD_STORE);
    let broken = project.write("src/app/broken.store.ts", UNBALANCED_STORE);
    let validator = PreValidator::new(".store.ts");

    let report = validator.validate(&good).await;
    assert!(report.is_valid, "{:?}", report.errors);

    let report = validator.validate(&broken).await;
    assert!(!report.is_valid);
    assert_eq!(report.errors[0].category, ErrorCategory::Syntax);

    let report = validator.validate(&project.root().join("src/app/missing.store.ts")).await;
    assert_eq!(report.errors[0].category, ErrorCategory::FileAccess);

    let report = validator.validate(&project.root().join("src")).await;
    assert_eq!(report.errors[0].message, "not a regular file");
}

#[tokio::test]
async fn missing_runtime_dependency_blocks() {
    let project = TestProject::new();
    project.write("package.json", PACKAGE_JSON_MISSING_OPERATORS);
    let path = project.write("src/bulk.store.ts", BULK_STORE);

    let report = PreValidator::new(".store.ts").validate(&path).await;
    assert!(!report.is_valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].category, ErrorCategory::Dependency);
    assert!(report.errors[0].message.contains("@ngrx/operators"));
}

#[test]
fn assembled_output_passes_post_validation() {
    let path = Path::new("projects.store.ts");
    let scanned = scan_source(path, SIMPLE_LOAD_STORE).unwrap();
    let verdicts: Vec<_> = scanned.methods.iter().map(|m| classify(m, &scanned.context)).collect();
    let plans: Vec<_> = scanned
        .methods
        .iter()
        .zip(&verdicts)
        .map(|(record, v)| PlannedConversion {
            record,
            label: v.label,
            confidence: v.confidence,
            manual_review: v.requires_manual_review,
        })
        .collect();
    let out = assemble(SIMPLE_LOAD_STORE, &plans, &scanned.context, &AssemblerOptions::default());

    let mut result = GenerationResult::unchanged(path, SIMPLE_LOAD_STORE);
    result.converted_code = out.text.clone();
    let report = PostValidator::new().validate(&result, &out.conversions);
    assert!(report.is_valid, "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    result.converted_code = out.text.replace("rxMethod } from", "rxMethodX } from");
    let report = PostValidator::new().validate(&result, &out.conversions);
    assert!(!report.is_valid);
    assert_eq!(report.errors[0].category, ErrorCategory::Import);
}

#[tokio::test]
async fn slow_program_check_is_skipped() {
    let config = TypeCheckConfig {
        enabled: true,
        ..TypeCheckConfig::default()
    };
    let checker = ProgramChecker::from_config(&config)
        .with_checker(Arc::new(SlowChecker))
        .with_timeout(Duration::from_millis(50));

    let report = checker.validate(Path::new(".")).await;
    assert!(report.is_valid);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].message.contains("skipped"));
}

#[cfg(unix)]
#[tokio::test]
async fn tsc_output_is_classified() {
    let project = TestProject::new();
    let config = TypeCheckConfig {
        enabled: true,
        command: vec![
            "sh".into(),
            "-c".into(),
            "echo \"src/a.store.ts(4,9): error TS2322: Type 'string' is not assignable to type 'number'.\"; exit 2".into(),
        ],
        ..TypeCheckConfig::default()
    };
    let report = ProgramChecker::from_config(&config).validate(project.root()).await;
    assert!(!report.is_valid);
    assert_eq!(report.errors[0].line, Some(4));
    assert_eq!(report.errors[0].category, ErrorCategory::PatternInvariant);

    let failing = TypeCheckConfig {
        command: vec!["sh".into(), "-c".into(), "echo boom >&2; exit 1".into()],
        ..config
    };
    let report = ProgramChecker::from_config(&failing).validate(project.root()).await;
    assert!(report.is_valid);
    assert!(report.warnings[0].message.contains("boom"));
}
