//! bulk-operation: fan an array parameter out through `bulkOperation`

use super::{
    indented, review_stub, simple_load, trailing_comma, GeneratedMethod, ImportSet, MethodInput,
    Scope, OPERATORS, RXJS,
};
use rxmig_core::PatternLabel;
use rxmig_scanner::detectors;

pub(super) fn generate(scope: &Scope<'_>) -> GeneratedMethod {
    let record = scope.record;
    let Some(array) = record.array_param() else {
        let mut fallback = simple_load::generate(scope);
        fallback.label = PatternLabel::BulkOperation;
        fallback
            .notes
            .push("no array parameter; generated the single-call shape".to_string());
        return fallback;
    };

    let body = record.body();
    let input = MethodInput::from_params(record.params());
    let ctx = scope.context;
    let mut notes = vec![
        "fan-out is unbounded: every element is requested concurrently; add a concurrency limit if the backend needs one"
            .to_string(),
    ];
    let mut review = false;

    let mut imports = ImportSet::base(scope);
    imports
        .add(RXJS, &["switchMap"])
        .add(OPERATORS, &["tapResponse"])
        .add(&scope.options.helper_module, &["bulkOperation"]);
    let with_loading = ctx.has_loading_flag();
    if with_loading {
        imports.add(RXJS, &["tap"]);
    }

    let span = detectors::fan_out_span(body);
    let fan_out = span.map_or(body, |(start, end)| &body[start..=end]);
    let item = detectors::item_binding(body, &array.name).unwrap_or("item");
    let element = array.element_type().unwrap_or_else(|| "unknown".to_string());
    let request = match detectors::collaborator_calls(fan_out).into_iter().next() {
        Some(call) => format!("({item}: {element}) => {}", call.text),
        None => {
            review = true;
            notes.push("no per-item collaborator call found; 'request' is a stub".to_string());
            imports.add(RXJS, &["EMPTY"]);
            format!("({item}: {element}) => EMPTY {}", review_stub("per-item request"))
        }
    };

    let mut options = vec![format!("request: {request},")];
    let progress_field = ctx
        .state_fields
        .iter()
        .find(|f| f.to_ascii_lowercase().contains("progress"));
    if let Some(field) = progress_field.filter(|_| detectors::has_progress_marker(body)) {
        options.push(format!(
            "onProgress: (done: number, total: number) => {},",
            scope.write(&[(field.as_str(), "done / total")])
        ));
    }

    let next = span
        .and_then(|(_, end)| {
            detectors::state_patches(&body[end..])
                .into_iter()
                .find(|p| !p.fields().iter().any(|f| Some(f) == ctx.loading_field.as_ref()))
        })
        .map_or_else(|| "() => undefined".to_string(), |p| format!("() => {}", p.text));
    notes.extend(scope.error_field_note());

    let mut stage = vec![format!("switchMap({} =>", input.binding)];
    let mut inner = vec![format!("bulkOperation({}, {{", array.name)];
    inner.extend(indented(&options, 1));
    inner.push("}).pipe(".to_string());
    inner.extend(indented(&trailing_comma(scope.response_handlers(&next, with_loading)), 1));
    inner.push("),".to_string());
    stage.extend(indented(&inner, 1));
    stage.push(")".to_string());

    let mut stages = Vec::new();
    if with_loading {
        stages.push(scope.loading_on());
    }
    stages.push(stage.join("\n"));

    GeneratedMethod {
        label: PatternLabel::BulkOperation,
        input,
        stages,
        imports: imports.into_entries(),
        notes,
        review,
        leading_comments: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateOptions;
    use pretty_assertions::assert_eq;
    use rxmig_core::{FileContext, MethodRecord, Parameter};

    fn scope_for<'a>(
        record: &'a MethodRecord,
        ctx: &'a FileContext,
        options: &'a TemplateOptions,
    ) -> Scope<'a> {
        Scope {
            record,
            context: ctx,
            options,
        }
    }

    #[test]
    fn array_is_fanned_out_through_helper() {
        let body = "{
  let completed = 0;
  await Promise.all(ids.map(async (id) => { await fileService.remove(id); completed++; patchState(store, { progress: completed }); }));
  patchState(store, { files: [] });
}";
        let record = MethodRecord::builder("deleteFiles")
            .params(vec![Parameter::new("ids").with_type("string[]")])
            .body(body)
            .build();
        let mut ctx = FileContext::default();
        ctx.state_fields.extend(["files".to_string(), "progress".into()]);
        let options = TemplateOptions::default();
        let generated = generate(&scope_for(&record, &ctx, &options));

        assert_eq!(generated.stages.len(), 1);
        assert_eq!(
            generated.stages[0],
            "switchMap((ids) =>
  bulkOperation(ids, {
    request: (id: string) => fileService.remove(id),
    onProgress: (done: number, total: number) => patchState(store, { progress: done / total }),
  }).pipe(
    tapResponse({
      next: () => patchState(store, { files: [] }),
      error: (error: unknown) => console.error(error),
    }),
  ),
)"
        );
        assert!(generated.notes[0].contains("unbounded"));
    }

    #[test]
    fn no_array_falls_back_to_single_call() {
        let record = MethodRecord::builder("syncAll")
            .params(vec![Parameter::new("id").with_type("string")])
            .body("{ await syncService.run(id); }")
            .build();
        let ctx = FileContext::default();
        let options = TemplateOptions::default();
        let generated = generate(&scope_for(&record, &ctx, &options));
        assert_eq!(generated.label, PatternLabel::BulkOperation);
        assert!(generated.stages[1].contains("from(syncService.run(id))"));
        assert!(generated.notes.iter().any(|n| n.contains("single-call shape")));
    }
}
