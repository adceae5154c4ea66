//! Scanner tests over the shared store fixtures

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rxmig_core::{MethodHost, PatternLabel, ResultType};
use rxmig_scanner::{scan_file, scan_source, ScanError};
use rxmig_test_utils::{
    lines, TestProject, ALREADY_CONVERTED_STORE, BULK_STORE, CLASS_STORE, CUSTOM_STORE,
    NO_CANDIDATES_STORE, OPTIMISTIC_STORE, SIMPLE_LOAD_STORE, UNBALANCED_STORE,
};
use std::path::Path;

fn scan(source: &str) -> rxmig_scanner::ScanOutput {
    scan_source(Path::new("fixture.store.ts"), source).unwrap()
}

#[test]
fn simple_load_fixture() {
    let out = scan(SIMPLE_LOAD_STORE);
    assert_eq!(out.methods.len(), 1);

    let method = &out.methods[0];
    assert_eq!(method.name(), "loadProjects");
    assert_eq!(method.host(), MethodHost::ObjectLiteral);
    assert_eq!(method.params()[0].name, "filter");
    assert!(method.markers().has_error_handling);
    assert!(method.markers().has_loading_toggle);
    assert!(!method.markers().has_rollback_marker);
    assert_eq!(method.pattern_guess(), PatternLabel::SimpleLoad);
    assert!(method
        .dependencies()
        .contains(&"projectService.getProjects".to_string()));

    let ctx = &out.context;
    assert_eq!(ctx.import_span(), Some((1, 4)));
    assert_eq!(ctx.loading_field.as_deref(), Some("loading"));
    assert_eq!(ctx.error_field.as_deref(), Some("error"));
    assert!(ctx.has_state_field("projects"));
    assert!(ctx.collaborators.contains("projectService"));
    assert_eq!(ctx.state_container, "store");
}

#[test]
fn optimistic_fixture() {
    let out = scan(OPTIMISTIC_STORE);
    let method = &out.methods[0];
    assert!(method.markers().has_rollback_marker);
    assert_eq!(method.pattern_guess(), PatternLabel::OptimisticUpdate);
    assert!(out.context.has_state_field("todos"));
}

#[test]
fn bulk_fixture() {
    let out = scan(BULK_STORE);
    let method = &out.methods[0];
    assert_eq!(method.array_param().map(|p| p.name.as_str()), Some("ids"));
    assert_eq!(method.pattern_guess(), PatternLabel::BulkOperation);
    assert!(method.dependencies().contains(&"Promise.all".to_string()));
    let fields: Vec<_> = out.context.state_fields.iter().cloned().collect();
    assert_eq!(fields, vec!["files", "progress", "loading", "error"]);
}

#[test]
fn custom_fixture_result_type() {
    let out = scan(CUSTOM_STORE);
    let method = &out.methods[0];
    assert_eq!(method.result_type(), &ResultType::Value("boolean".to_string()));
    assert_eq!(method.params()[1].default_value.as_deref(), Some("false"));
    assert!(out.context.collaborators.contains("auditService"));
}

#[test]
fn class_fixture() {
    let out = scan(CLASS_STORE);
    let method = &out.methods[0];
    assert_eq!(method.host(), MethodHost::Class);
    assert_eq!(method.indent(), "  ");
    assert!(out.context.collaborators.contains("userApi"));
    assert_eq!(out.context.loading_field.as_deref(), Some("isLoading"));
    assert_eq!(out.context.error_field.as_deref(), Some("errorMessage"));
}

#[test]
fn unbalanced_fixture_is_a_syntax_error() {
    let err = scan_source(Path::new("broken.store.ts"), UNBALANCED_STORE).unwrap_err();
    assert!(matches!(err, ScanError::Syntax { .. }), "{err}");
}

#[test]
fn no_candidates_and_converted() {
    assert!(scan(NO_CANDIDATES_STORE).is_empty());

    let out = scan(ALREADY_CONVERTED_STORE);
    assert!(out.is_empty());
    assert!(out.context.is_converted("tick"));
}

#[test]
fn scan_file_reads_from_disk() {
    let project = TestProject::new();
    let path = project.write("src/projects.store.ts", SIMPLE_LOAD_STORE);
    assert_eq!(scan_file(&path).unwrap().methods.len(), 1);

    let missing = scan_file(project.root().join("missing.store.ts")).unwrap_err();
    assert!(matches!(missing, ScanError::Io { .. }));
}

#[test]
fn records_carry_their_verbatim_lines() {
    for fixture in [SIMPLE_LOAD_STORE, OPTIMISTIC_STORE, BULK_STORE, CUSTOM_STORE, CLASS_STORE] {
        let all = lines(fixture);
        for method in scan(fixture).methods {
            assert!(method.start_line() <= method.end_line());
            let expected = all[method.start_line() - 1..method.end_line()].join("\n");
            assert_eq!(method.source(), expected);
        }
    }
}

proptest! {
    #[test]
    fn generated_stores_yield_disjoint_ranges(
        names in proptest::collection::btree_set("load[A-Z][a-z]{2,6}", 1..6),
        blank_lines in 0usize..3,
    ) {
        let mut source = String::from("export class GeneratedStore {\n");
        for name in &names {
            source.push_str(&format!(
                "  async {name}(id: string): Promise<void> {{\n    await this.dataService.{name}(id);\n  }}\n"
            ));
            source.push_str(&"\n".repeat(blank_lines));
        }
        source.push_str("}\n");

        let out = scan(&source);
        prop_assert_eq!(out.methods.len(), names.len());
        for pair in out.methods.windows(2) {
            prop_assert!(pair[0].end_line() < pair[1].start_line());
        }
        for method in &out.methods {
            prop_assert!(method.start_line() <= method.end_line());
            prop_assert_eq!(method.line_count(), 3);
        }
    }
}
