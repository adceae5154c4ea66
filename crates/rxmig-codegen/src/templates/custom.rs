//! custom-fallback: scaffolding plus the original body for a human to port

use super::{
    indented, review_stub, trailing_comma, GeneratedMethod, ImportSet, MethodInput, Scope,
    OPERATORS, RXJS,
};
use rxmig_core::{PatternLabel, MANUAL_REVIEW_MARKER};

pub(super) fn generate(scope: &Scope<'_>) -> GeneratedMethod {
    let record = scope.record;
    let input = MethodInput::from_params(record.params());

    let mut imports = ImportSet::base(scope);
    imports
        .add(RXJS, &["tap", "switchMap", "EMPTY"])
        .add(OPERATORS, &["tapResponse"]);

    let mut leading = vec![format!(
        "{MANUAL_REVIEW_MARKER} no template fits '{}'; port the original below into the pipeline",
        record.name()
    )];
    let indent = record.indent();
    leading.extend(record.source().split('\n').map(|line| {
        let line = line.strip_prefix(indent).unwrap_or(line).trim_end();
        line.to_string()
    }));

    let mut stage = vec!["switchMap(() =>".to_string()];
    let mut inner = vec![format!("EMPTY.pipe( {}", review_stub("replace EMPTY with the request"))];
    inner.extend(indented(
        &trailing_comma(scope.response_handlers("() => undefined", true)),
        1,
    ));
    inner.push("),".to_string());
    stage.extend(indented(&inner, 1));
    stage.push(")".to_string());

    let mut notes = vec![format!(
        "'{}' needs manual conversion; the original body is kept as comments",
        record.name()
    )];
    notes.extend(scope.error_field_note());

    GeneratedMethod {
        label: PatternLabel::CustomFallback,
        input,
        stages: vec![scope.loading_on(), stage.join("\n")],
        imports: imports.into_entries(),
        notes,
        review: true,
        leading_comments: leading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateOptions;
    use rxmig_core::{FileContext, MethodRecord};

    #[test]
    fn original_source_is_kept_as_comments() {
        let source = "    async sync(): Promise<void> {\n      await a();\n    },";
        let record = MethodRecord::builder("sync")
            .span(source, 10, 12)
            .indent("    ")
            .body("{\n      await a();\n    }")
            .build();
        let ctx = FileContext::default();
        let options = TemplateOptions::default();
        let generated = generate(&Scope {
            record: &record,
            context: &ctx,
            options: &options,
        });

        assert!(generated.review);
        assert!(generated.leading_comments[0].starts_with(MANUAL_REVIEW_MARKER));
        assert_eq!(
            &generated.leading_comments[1..],
            &["async sync(): Promise<void> {", "  await a();", "},"]
        );
        assert!(generated.stages[1].contains("EMPTY.pipe("));
    }
}
