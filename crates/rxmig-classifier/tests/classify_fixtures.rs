//! Classification of the shared store fixtures

use proptest::prelude::*;
use rxmig_classifier::{classify, classify_with};
use rxmig_core::{MethodRecord, Parameter, PatternLabel, Thresholds};
use rxmig_scanner::{detectors, scan_source};
use rxmig_test_utils::{BULK_STORE, CLASS_STORE, CUSTOM_STORE, OPTIMISTIC_STORE, SIMPLE_LOAD_STORE};
use std::path::Path;

fn classify_first(source: &str) -> rxmig_core::ClassificationResult {
    let out = scan_source(Path::new("fixture.store.ts"), source).unwrap();
    classify(&out.methods[0], &out.context)
}

#[test]
fn simple_load_scenario() {
    let result = classify_first(SIMPLE_LOAD_STORE);
    assert_eq!(result.label, PatternLabel::SimpleLoad);
    assert!(result.confidence >= 60, "confidence {}", result.confidence);
    assert!(!result.requires_manual_review);
}

#[test]
fn losing_rules_still_warn() {
    let result = classify_first(SIMPLE_LOAD_STORE);
    assert_eq!(result.label, PatternLabel::SimpleLoad);
    assert!(result
        .warnings
        .iter()
        .any(|w| w == "no array parameter; falls back to the single-call shape"));
    assert!(!result.warnings.iter().any(|w| w.contains("manual review required")));
}

#[test]
fn class_store_is_simple_load() {
    let result = classify_first(CLASS_STORE);
    assert_eq!(result.label, PatternLabel::SimpleLoad);
    assert!(result.confidence >= 60);
}

#[test]
fn optimistic_scenario() {
    let result = classify_first(OPTIMISTIC_STORE);
    assert_eq!(result.label, PatternLabel::OptimisticUpdate);
    assert!(result.confidence >= 80);
    assert!(result
        .alternatives
        .iter()
        .any(|a| a.label == PatternLabel::SimpleLoad));
}

#[test]
fn bulk_scenario() {
    let result = classify_first(BULK_STORE);
    assert_eq!(result.label, PatternLabel::BulkOperation);
    assert!(result.confidence >= 50);
    assert!(result.warnings.iter().any(|w| w.contains("unbounded")));
}

#[test]
fn complex_method_falls_back() {
    let result = classify_first(CUSTOM_STORE);
    assert_eq!(result.label, PatternLabel::CustomFallback);
    assert!(result.confidence >= 20);
    assert!(result.requires_manual_review);
    assert!(result.warnings.iter().any(|w| w.contains("manual review")));
}

#[test]
fn stricter_thresholds_force_review() {
    let out = scan_source(Path::new("fixture.store.ts"), BULK_STORE).unwrap();
    let thresholds = Thresholds {
        manual_review: 95,
        ..Thresholds::default()
    };
    let result = classify_with(&out.methods[0], &out.context, &thresholds);
    assert!(result.requires_manual_review);
}

fn record_from(body: String, array: bool) -> MethodRecord {
    let params = if array {
        vec![Parameter::new("ids").with_type("string[]")]
    } else {
        vec![Parameter::new("id").with_type("string")]
    };
    let markers = detectors::detect_markers(&body);
    MethodRecord::builder("run")
        .params(params)
        .markers(markers)
        .body(body)
        .build()
}

proptest! {
    #[test]
    fn confidence_stays_in_bounds(
        statements in proptest::collection::vec(
            prop_oneof![
                Just("await userService.load(id);"),
                Just("patchState(store, { loading: true });"),
                Just("patchState(store, { loading: false });"),
                Just("const previous = store.items();"),
                Just("try { await api.x(); } catch (e) { patchState(store, { items: previous }); }"),
                Just("if (x) { y(); }"),
                Just("await Promise.all(ids.map((id) => fileService.remove(id)));"),
                Just("progress++;"),
                Just("// revert on failure"),
            ],
            0..40,
        ),
        array in any::<bool>(),
    ) {
        let body = format!("{{\n{}\n}}", statements.join("\n"));
        let result = classify(&record_from(body, array), &rxmig_core::FileContext::default());
        prop_assert!(result.confidence <= 100);
        if result.label == PatternLabel::CustomFallback {
            prop_assert!(result.confidence >= 20);
        }
        for alt in &result.alternatives {
            prop_assert!(alt.confidence > 30 && alt.confidence <= result.confidence);
        }
    }
}
