//! Layout of a generated method in its host

use crate::templates::GeneratedMethod;
use rxmig_core::{MethodHost, MethodRecord, Parameter};

/// Suffix of generated compatibility wrappers
pub const WRAPPER_SUFFIX: &str = "Async";

/// Layout switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Emit a `<name>Async` wrapper after the method
    pub compatibility: bool,
    /// Emit a provenance comment above the method
    pub provenance: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            compatibility: true,
            provenance: true,
        }
    }
}

/// Generated text ready to replace a method's line range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMethod {
    /// Every replacement line, indented
    pub lines: Vec<String>,
    /// Reactive-pipeline method text
    pub body: String,
    /// Compatibility wrapper text
    pub wrapper: Option<String>,
}

/// Lay out `generated` in place of `record`
///
/// `suffix` is whatever followed the closing brace on the method's last line
/// (`,` in object literals, usually nothing in classes).
#[must_use]
pub fn render(
    record: &MethodRecord,
    generated: &GeneratedMethod,
    confidence: u8,
    suffix: &str,
    layout: LayoutOptions,
) -> RenderedMethod {
    let host = record.host();
    let mut head: Vec<String> = generated
        .leading_comments
        .iter()
        .map(|c| {
            if c.is_empty() {
                "//".to_string()
            } else {
                format!("// {c}")
            }
        })
        .collect();
    if layout.provenance {
        head.push(format!(
            "// rx-migrate: {} (confidence {confidence}%)",
            generated.label
        ));
    }

    let mut body = match host {
        MethodHost::ObjectLiteral => vec![format!(
            "{}: rxMethod<{}>(",
            record.name(),
            generated.input.type_text
        )],
        MethodHost::Class => vec![format!(
            "{}readonly {} = rxMethod<{}>(",
            class_modifiers(record.source()),
            record.name(),
            generated.input.type_text
        )],
    };
    body.push("  pipe(".to_string());
    body.extend(stage_lines(&generated.stages, 2));
    body.push("  ),".to_string());

    let wrapper = layout.compatibility.then(|| wrapper_lines(record, generated));
    let close = match (host, wrapper.is_some()) {
        (MethodHost::ObjectLiteral, true) => "),".to_string(),
        (MethodHost::ObjectLiteral, false) => format!("){suffix}"),
        (MethodHost::Class, _) => format!(");{}", class_suffix(suffix)),
    };
    body.push(close);

    let mut lines = head;
    lines.extend(body.iter().cloned());
    let wrapper = wrapper.map(|mut w| {
        if let Some(last) = w.last_mut() {
            match host {
                MethodHost::ObjectLiteral => last.push_str(suffix),
                MethodHost::Class => last.push_str(class_suffix(suffix)),
            }
        }
        lines.extend(w.iter().cloned());
        w.join("\n")
    });

    let indent = record.indent();
    let lines = lines
        .into_iter()
        .map(|l| if l.is_empty() { l } else { format!("{indent}{l}") })
        .collect();

    RenderedMethod {
        lines,
        body: body.join("\n"),
        wrapper,
    }
}

/// Stages as `pipe` arguments, one trailing comma each
fn stage_lines(stages: &[String], depth: usize) -> Vec<String> {
    let pad = "  ".repeat(depth);
    let mut lines = Vec::new();
    for stage in stages {
        let mut stage_lines: Vec<String> = stage.split('\n').map(|l| format!("{pad}{l}")).collect();
        if let Some(last) = stage_lines.last_mut() {
            last.push(',');
        }
        lines.extend(stage_lines);
    }
    lines
}

fn wrapper_lines(record: &MethodRecord, generated: &GeneratedMethod) -> Vec<String> {
    let params: Vec<String> = record.params().iter().map(Parameter::render).collect();
    let result = record.result_type();
    let modifiers = match record.host() {
        MethodHost::Class => class_modifiers(record.source()),
        MethodHost::ObjectLiteral => String::new(),
    };

    let mut lines = vec![
        format!(
            "{modifiers}{}{WRAPPER_SUFFIX}({}): {} {{",
            record.name(),
            params.join(", "),
            result.declared()
        ),
        "  return firstValueFrom(".to_string(),
        format!("    of({}).pipe(", generated.input.value),
    ];
    lines.extend(stage_lines(&generated.stages, 3));
    lines.push("    ),".to_string());
    if result.is_void() {
        lines.push("    { defaultValue: undefined },".to_string());
        lines.push("  ).then(() => undefined);".to_string());
    } else {
        lines.push("  );".to_string());
    }
    lines.push("}".to_string());
    lines
}

/// Access and `static` modifiers carried over from a class method
fn class_modifiers(source: &str) -> String {
    let mut out = String::new();
    for token in source.split_whitespace() {
        match token {
            "public" | "private" | "protected" | "static" => {
                out.push_str(token);
                out.push(' ');
            }
            "override" => {}
            _ => break,
        }
    }
    out
}

fn class_suffix(suffix: &str) -> &str {
    suffix.strip_prefix(';').unwrap_or(suffix)
}
