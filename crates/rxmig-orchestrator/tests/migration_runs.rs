//! Whole runs, on disk and in memory

use pretty_assertions::assert_eq;
use rxmig_core::{ErrorCategory, MigrationConfig, MigrationReport, ReportFormat, TypeCheckConfig};
use rxmig_orchestrator::{
    backup_path, FileSystem, MemoryFs, MigrationError, MigrationTarget, Migrator, RenderReport,
};
use rxmig_test_utils::{
    preview_config, test_config, TestProject, BULK_STORE, NO_CANDIDATES_STORE, OPTIMISTIC_STORE,
    SIMPLE_LOAD_STORE, UNBALANCED_STORE,
};
use rxmig_validator::{
    parse_diagnostics, Diagnostic, FileProbe, StaticManifest, TypeChecker, ValidatorError,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BACKUP: &str = ".rxmig.bak";

fn project() -> TestProject {
    let project = TestProject::with_manifest();
    project.write("src/app/projects.store.ts", SIMPLE_LOAD_STORE);
    project.write("src/app/todos.store.ts", OPTIMISTIC_STORE);
    project.write("src/app/files.store.ts", BULK_STORE);
    project.write("src/app/broken.store.ts", UNBALANCED_STORE);
    project.write("src/app/counter.store.ts", NO_CANDIDATES_STORE);
    project.write("src/app/projects.store.spec.ts", "describe('x', () => {});\n");
    project
}

fn result_for<'a>(report: &'a MigrationReport, name: &str) -> &'a rxmig_core::GenerationResult {
    report
        .files
        .iter()
        .find(|f| f.path.file_name().is_some_and(|n| n == name))
        .unwrap_or_else(|| panic!("no result for {name}"))
}

#[tokio::test]
async fn end_to_end_on_disk() {
    let project = project();
    let report = Migrator::new(test_config())
        .unwrap()
        .run(MigrationTarget::directory(project.root()))
        .await
        .unwrap();

    let stats = &report.stats;
    assert_eq!(stats.files_discovered, 5);
    assert_eq!(stats.files_excluded, 0);
    assert_eq!(stats.files_failed_prevalidation, 1);
    assert_eq!(stats.files_processed, 4);
    assert_eq!(stats.files_succeeded, 4);
    assert_eq!(stats.methods_found, 3);
    assert_eq!(stats.methods_converted, 3);
    assert_eq!(stats.files_rolled_back, 0);
    assert!(!report.is_success());

    let broken = result_for(&report, "broken.store.ts");
    assert!(!broken.success);
    let validation = broken.validation.as_ref().unwrap();
    assert_eq!(validation.errors[0].category, ErrorCategory::Syntax);

    let converted = project.read("src/app/projects.store.ts");
    assert!(converted.contains("loadProjects: rxMethod<string>("));
    assert!(converted.contains("loadProjectsAsync(filter: string): Promise<void> {"));
    assert_eq!(project.read("src/app/projects.store.ts.rxmig.bak"), SIMPLE_LOAD_STORE);
    assert_eq!(project.read("src/app/counter.store.ts"), NO_CANDIDATES_STORE);
    assert!(!project.exists("src/app/broken.store.ts.rxmig.bak"));
    assert_eq!(project.read("src/app/broken.store.ts"), UNBALANCED_STORE);
}

#[tokio::test]
async fn preview_writes_nothing() {
    let project = project();
    let report = Migrator::new(preview_config())
        .unwrap()
        .run(MigrationTarget::directory(project.root()))
        .await
        .unwrap();

    assert_eq!(report.stats.methods_converted, 3);
    assert!(result_for(&report, "todos.store.ts").is_modified());
    assert_eq!(project.read("src/app/projects.store.ts"), SIMPLE_LOAD_STORE);
    assert_eq!(project.read("src/app/todos.store.ts"), OPTIMISTIC_STORE);
    assert!(!project.exists("src/app/projects.store.ts.rxmig.bak"));
}

/// Reports a type error in one file
#[derive(Debug)]
struct FailingChecker(&'static str);

#[async_trait::async_trait]
impl TypeChecker for FailingChecker {
    async fn check(&self, _project_dir: &Path) -> Result<Vec<Diagnostic>, ValidatorError> {
        Ok(parse_diagnostics(&format!(
            "{}(3,1): error TS2322: Type 'Observable<void>' is not assignable to type 'Promise<void>'.",
            self.0
        )))
    }
}

#[tokio::test]
async fn failed_files_are_rolled_back() {
    let project = project();
    let mut config = test_config();
    config.type_check = TypeCheckConfig {
        enabled: true,
        ..TypeCheckConfig::default()
    };
    let report = Migrator::new(config)
        .unwrap()
        .with_type_checker(Arc::new(FailingChecker("src/app/files.store.ts")))
        .run(MigrationTarget::directory(project.root()))
        .await
        .unwrap();

    let files = result_for(&report, "files.store.ts");
    assert!(!files.success);
    assert!(files.warnings.iter().any(|w| w == "restored from backup"));
    assert_eq!(report.stats.files_rolled_back, 1);
    assert_eq!(report.stats.files_failed, 1);
    assert_eq!(project.read("src/app/files.store.ts"), BULK_STORE);
    assert_ne!(project.read("src/app/projects.store.ts"), SIMPLE_LOAD_STORE);
}

#[tokio::test]
async fn write_failure_aborts_and_restores() {
    let fs = Arc::new(
        MemoryFs::new()
            .with_file("/p/a.store.ts", SIMPLE_LOAD_STORE)
            .with_file("/p/b.store.ts", OPTIMISTIC_STORE)
            .failing_writes_to("/p/b.store.ts"),
    );
    let migrator = Migrator::new(test_config().with_max_parallel_files(1))
        .unwrap()
        .with_file_system(fs.clone())
        .with_manifest(Arc::new(StaticManifest::complete()));

    let err = migrator.run(MigrationTarget::directory("/p")).await.unwrap_err();
    assert!(matches!(err, MigrationError::Write { .. }));
    assert_eq!(fs.contents(Path::new("/p/a.store.ts")).as_deref(), Some(SIMPLE_LOAD_STORE));
    assert!(fs.exists(&backup_path(Path::new("/p/a.store.ts"), BACKUP)));
}

/// Memory file system whose reads of one path fail after probing
#[derive(Debug)]
struct UnreadableFile {
    inner: MemoryFs,
    path: PathBuf,
}

#[async_trait::async_trait]
impl FileSystem for UnreadableFile {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if path == self.path {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"));
        }
        self.inner.read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.inner.write(path, contents).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn probe(&self, path: &Path) -> FileProbe {
        self.inner.probe(path).await
    }

    async fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_files(root).await
    }
}

#[tokio::test]
async fn stop_on_first_error_halts_between_batches() {
    let fs = Arc::new(UnreadableFile {
        inner: MemoryFs::new()
            .with_file("/p/a.store.ts", SIMPLE_LOAD_STORE)
            .with_file("/p/b.store.ts", OPTIMISTIC_STORE)
            .with_file("/p/c.store.ts", BULK_STORE),
        path: PathBuf::from("/p/a.store.ts"),
    });
    let config = test_config()
        .with_max_parallel_files(1)
        .with_backups(false)
        .with_stop_on_first_error(true);
    let report = Migrator::new(config)
        .unwrap()
        .with_file_system(fs.clone())
        .with_manifest(Arc::new(StaticManifest::complete()))
        .run(MigrationTarget::directory("/p"))
        .await
        .unwrap();

    assert!(report.stats.halted_early);
    assert_eq!(report.stats.files_processed, 1);
    assert_eq!(report.stats.files_failed, 1);
    assert_eq!(
        fs.inner.contents(Path::new("/p/b.store.ts")).as_deref(),
        Some(OPTIMISTIC_STORE)
    );
}

#[tokio::test]
async fn keeps_going_without_stop_on_first_error() {
    let fs = Arc::new(UnreadableFile {
        inner: MemoryFs::new()
            .with_file("/p/a.store.ts", SIMPLE_LOAD_STORE)
            .with_file("/p/b.store.ts", OPTIMISTIC_STORE),
        path: PathBuf::from("/p/a.store.ts"),
    });
    let report = Migrator::new(test_config().with_max_parallel_files(1).with_backups(false))
        .unwrap()
        .with_file_system(fs.clone())
        .with_manifest(Arc::new(StaticManifest::complete()))
        .run(MigrationTarget::directory("/p"))
        .await
        .unwrap();

    assert!(!report.stats.halted_early);
    assert_eq!(report.stats.files_processed, 2);
    assert_eq!(report.stats.files_succeeded, 1);
    assert_ne!(
        fs.inner.contents(Path::new("/p/b.store.ts")).as_deref(),
        Some(OPTIMISTIC_STORE)
    );
}

#[tokio::test]
async fn report_is_persisted() {
    let project = project();
    let path = project.root().join("migration-report.json");
    let config = preview_config().with_report(ReportFormat::Json, &path);
    let report = Migrator::new(config)
        .unwrap()
        .run(MigrationTarget::files(project.root(), ["src/app/projects.store.ts"]))
        .await
        .unwrap();

    assert!(report.is_success());
    let persisted: MigrationReport =
        serde_json::from_str(&project.read("migration-report.json")).unwrap();
    assert_eq!(persisted.run_id, report.run_id);
    assert_eq!(persisted.files.len(), 1);

    let text = ReportFormat::StructuredText.render(&report).unwrap();
    assert!(text.contains("mode:     preview"));
}

#[tokio::test]
async fn missing_root_is_a_run_error() {
    let project = TestProject::new();
    let err = Migrator::new(MigrationConfig::new())
        .unwrap()
        .run(MigrationTarget::directory(project.root().join("absent")))
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::Discovery { .. }));
}
