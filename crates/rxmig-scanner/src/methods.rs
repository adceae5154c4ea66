//! Candidate method extraction
//!
//! A candidate is a `method_definition` carrying the `async` modifier whose
//! parent is a class body or an object literal. The walk never descends into a
//! candidate, so the line ranges of the returned records are disjoint.

use crate::detectors;
use crate::language::{children, named_children, node_text};
use rxmig_core::{MethodHost, MethodRecord, Parameter, ResultType};
use tree_sitter::{Node, Tree};

/// Collect candidate methods in source order
#[must_use]
pub fn collect_methods(tree: &Tree, source: &str) -> Vec<MethodRecord> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut out = Vec::new();
    visit(tree.root_node(), source, &lines, &mut out);
    out
}

fn visit(node: Node<'_>, source: &str, lines: &[&str], out: &mut Vec<MethodRecord>) {
    if node.kind() == "method_definition" && is_async(node) {
        if let Some(host) = host_of(node) {
            if let Some(record) = build_record(node, host, source, lines) {
                out.push(record);
                return;
            }
        }
    }
    for child in named_children(node) {
        visit(child, source, lines, out);
    }
}

fn is_async(node: Node<'_>) -> bool {
    children(node).iter().any(|c| c.kind() == "async")
}

fn host_of(node: Node<'_>) -> Option<MethodHost> {
    match node.parent()?.kind() {
        "class_body" => Some(MethodHost::Class),
        "object" => Some(MethodHost::ObjectLiteral),
        _ => None,
    }
}

fn build_record(
    node: Node<'_>,
    host: MethodHost,
    source: &str,
    lines: &[&str],
) -> Option<MethodRecord> {
    let name = node_text(node.child_by_field_name("name")?, source);
    let body = node_text(node.child_by_field_name("body")?, source);

    let params = node
        .child_by_field_name("parameters")
        .map(|p| parse_parameters(p, source))
        .unwrap_or_default();
    let annotation = node
        .child_by_field_name("return_type")
        .map(|rt| strip_annotation(node_text(rt, source)));
    let result_type = ResultType::from_annotation(annotation);

    let start_line = node.start_position().row + 1;
    let end_line = node.end_position().row + 1;
    let span_text = lines.get(start_line - 1..end_line)?.join("\n");
    let indent: String = lines[start_line - 1]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();

    let markers = detectors::detect_markers(body);
    let pattern_guess = detectors::guess_pattern(&params, body, markers);

    Some(
        MethodRecord::builder(name)
            .params(params)
            .result_type(result_type)
            .body(body)
            .span(span_text, start_line, end_line)
            .indent(indent)
            .host(host)
            .markers(markers)
            .dependencies(detectors::extract_dependencies(body))
            .pattern_guess(pattern_guess)
            .build(),
    )
}

/// Parameters of a `formal_parameters` node
pub(crate) fn parse_parameters(node: Node<'_>, source: &str) -> Vec<Parameter> {
    named_children(node)
        .into_iter()
        .filter(|p| matches!(p.kind(), "required_parameter" | "optional_parameter"))
        .filter_map(|p| {
            let pattern = p.child_by_field_name("pattern")?;
            Some(Parameter {
                name: node_text(pattern, source).to_string(),
                type_text: p
                    .child_by_field_name("type")
                    .map(|t| strip_annotation(node_text(t, source)).to_string()),
                optional: p.kind() == "optional_parameter",
                default_value: p
                    .child_by_field_name("value")
                    .map(|v| node_text(v, source).to_string()),
            })
        })
        .collect()
}

#[inline]
fn strip_annotation(text: &str) -> &str {
    text.trim_start().trim_start_matches(':').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SourceLanguage;
    use pretty_assertions::assert_eq;
    use rxmig_core::PatternLabel;

    fn scan(source: &str) -> Vec<MethodRecord> {
        let tree = SourceLanguage::TypeScript.parse_strict(source).unwrap();
        collect_methods(&tree, source)
    }

    #[test]
    fn object_literal_candidates() {
        let source = "\
export const S = signalStore(
  withMethods((store, projectService = inject(ProjectService)) => ({
    async loadProjects(filter?: string, page: number = 1): Promise<void> {
      try {
        const projects = await projectService.list(filter, page);
        patchState(store, { projects });
      } catch (e) {
        patchState(store, { error: String(e) });
      }
    },
    reset() {
      patchState(store, { projects: [] });
    },
  })),
);
";
        let methods = scan(source);
        assert_eq!(methods.len(), 1);
        let m = &methods[0];
        assert_eq!(m.name(), "loadProjects");
        assert_eq!(m.host(), MethodHost::ObjectLiteral);
        assert_eq!((m.start_line(), m.end_line()), (3, 10));
        assert_eq!(m.indent(), "    ");
        assert_eq!(m.params().len(), 2);
        assert!(m.params()[0].optional);
        assert_eq!(m.params()[0].type_text.as_deref(), Some("string"));
        assert_eq!(m.params()[1].default_value.as_deref(), Some("1"));
        assert_eq!(m.result_type(), &ResultType::Void);
        assert!(m.body().starts_with('{') && m.body().ends_with('}'));
        assert!(m.source().starts_with("    async loadProjects("));
        assert!(m.markers().has_error_handling);
        assert_eq!(m.pattern_guess(), PatternLabel::SimpleLoad);
        assert_eq!(m.dependencies()[0], "projectService.list");
    }

    #[test]
    fn class_candidates_and_result_types() {
        let source = "\
export class UserStore {
  constructor(private readonly userApi: UserApi) {}

  async count(): Promise<number> {
    return await this.userApi.count();
  }

  async save(user: User) {
    await this.userApi.save(user);
  }
}
";
        let methods = scan(source);
        let names: Vec<_> = methods.iter().map(MethodRecord::name).collect();
        assert_eq!(names, vec!["count", "save"]);
        assert_eq!(methods[0].host(), MethodHost::Class);
        assert_eq!(methods[0].result_type(), &ResultType::Value("number".to_string()));
        assert_eq!(methods[1].result_type(), &ResultType::Void);
        assert!(!methods[0].overlaps(&methods[1]));
    }

    #[test]
    fn arrow_properties_and_plain_methods_are_ignored() {
        let source = "\
const api = {
  load: async () => { await fetch('/x'); },
  plain() { return 1; },
};
";
        assert!(scan(source).is_empty());
    }

    #[test]
    fn nested_candidates_are_not_collected() {
        let source = "\
class Outer {
  async run() {
    const inner = {
      async nested() { await x(); },
    };
    await inner.nested();
  }
}
";
        let methods = scan(source);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name(), "run");
    }
}
