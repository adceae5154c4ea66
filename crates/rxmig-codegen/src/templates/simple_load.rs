//! simple-load: one collaborator call between a loading toggle

use super::{
    indented, review_stub, subject_of, trailing_comma, GeneratedMethod, ImportSet, MethodInput,
    Scope, OPERATORS, RXJS,
};
use rxmig_core::PatternLabel;
use rxmig_scanner::detectors;

pub(super) fn generate(scope: &Scope<'_>) -> GeneratedMethod {
    let record = scope.record;
    let body = record.body();
    let input = MethodInput::from_params(record.params());
    let mut notes = Vec::new();
    let mut review = false;

    let mut imports = ImportSet::base(scope);
    imports
        .add(RXJS, &["tap", "switchMap"])
        .add(OPERATORS, &["tapResponse"]);

    let call = detectors::collaborator_calls(body).into_iter().next();
    let source = match &call {
        Some(call) => {
            imports.add(RXJS, &["from"]);
            format!("from({})", call.text)
        }
        None => {
            review = true;
            notes.push("no collaborator call found; the request is an empty stub".to_string());
            imports.add(RXJS, &["EMPTY"]);
            format!("EMPTY {}", review_stub("request stub"))
        }
    };

    let binding = call
        .as_ref()
        .and_then(|c| detectors::awaited_binding(body, c.offset));
    let next = match result_field(scope, binding) {
        Some(field) => {
            let value = binding.unwrap_or(field.as_str());
            format!("({value}) => {}", scope.write(&[(field.as_str(), value)]))
        }
        None => {
            review = true;
            notes.push("no state field matched the loaded value; 'next' is a stub".to_string());
            format!("() => {{ {} }}", review_stub("store the result"))
        }
    };
    notes.extend(scope.error_field_note());

    let mut request = vec![format!("switchMap({} =>", input.binding)];
    let mut inner = vec![format!("{source}.pipe(")];
    inner.extend(indented(&trailing_comma(scope.response_handlers(&next, true)), 1));
    inner.push("),".to_string());
    request.extend(indented(&inner, 1));
    request.push(")".to_string());

    GeneratedMethod {
        label: PatternLabel::SimpleLoad,
        input,
        stages: vec![scope.loading_on(), request.join("\n")],
        imports: imports.into_entries(),
        notes,
        review,
        leading_comments: Vec::new(),
    }
}

/// State field receiving the loaded value
fn result_field(scope: &Scope<'_>, binding: Option<&str>) -> Option<String> {
    let ctx = scope.context;
    if let Some(name) = binding.filter(|b| ctx.has_state_field(b)) {
        return Some(name.to_string());
    }
    subject_of(scope.record.name()).filter(|s| ctx.has_state_field(s))
}
