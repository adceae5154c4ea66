//! optimistic-update: apply locally, request, roll back on failure

use super::{indented, review_stub, GeneratedMethod, ImportSet, MethodInput, Scope, RXJS};
use once_cell::sync::Lazy;
use regex::Regex;
use rxmig_core::PatternLabel;
use rxmig_scanner::context::{is_error_name, is_loading_name};
use rxmig_scanner::detectors;

static CATCH_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bcatch\s*\(\s*([A-Za-z_$][A-Za-z0-9_$]*)").expect("catch binding regex is valid")
});

pub(super) fn generate(scope: &Scope<'_>) -> GeneratedMethod {
    let record = scope.record;
    let body = record.body();
    let input = MethodInput::from_params(record.params());
    let mut notes = Vec::new();
    let mut review = false;

    let mut imports = ImportSet::base(scope);
    imports
        .add(RXJS, &["switchMap"])
        .add(&scope.options.helper_module, &["optimisticUpdate"]);

    let first_await = detectors::first_await(body);
    let catch_at = body.find("catch");
    let patches = detectors::state_patches(body);

    let apply = patches
        .iter()
        .filter(|p| first_await.is_some_and(|aw| p.offset < aw))
        .find(|p| p.fields().iter().any(|f| !is_loading_name(f) && !is_error_name(f)));
    let apply = match apply {
        Some(patch) => format!("() => {}", patch.text),
        None => {
            review = true;
            notes.push("no local mutation before the request; 'apply' is a stub".to_string());
            format!("() => {{ {} }}", review_stub("apply the change locally"))
        }
    };

    let request = match detectors::collaborator_calls(body).into_iter().next() {
        Some(call) => format!("() => {}", call.text),
        None => {
            review = true;
            notes.push("no collaborator call found; 'request' is a stub".to_string());
            imports.add(RXJS, &["EMPTY"]);
            format!("() => EMPTY {}", review_stub("request stub"))
        }
    };

    let error_name = CATCH_BINDING
        .captures(body)
        .and_then(|c| c.get(1))
        .map_or("error", |m| m.as_str());
    let rollback = catch_at.and_then(|c| patches.iter().find(|p| p.offset > c));
    let rollback = match rollback {
        Some(patch) => format!("({error_name}: unknown) => {}", patch.text),
        None => {
            review = true;
            notes.push("no state restore inside the catch block; 'rollback' is a stub".to_string());
            format!("() => {{ {} }}", review_stub("restore the previous state"))
        }
    };

    let mut block = vec![format!("switchMap({} => {{", input.binding)];
    let mut inner: Vec<String> = detectors::snapshot_statements(body)
        .into_iter()
        .map(str::to_string)
        .collect();
    inner.push("return optimisticUpdate({".to_string());
    inner.extend(indented(
        &[
            format!("apply: {apply},"),
            format!("request: {request},"),
            format!("rollback: {rollback},"),
        ],
        1,
    ));
    inner.push("});".to_string());
    block.extend(indented(&inner, 1));
    block.push("})".to_string());

    GeneratedMethod {
        label: PatternLabel::OptimisticUpdate,
        input,
        stages: vec![block.join("\n")],
        imports: imports.into_entries(),
        notes,
        review,
        leading_comments: Vec::new(),
    }
}
