//! Textual detectors run over method bodies
//!
//! Each detector is independent and only looks at body text. They feed the
//! scanner's markers and the classifier's signals.

use crate::lexical;
use once_cell::sync::Lazy;
use regex::Regex;
use rxmig_core::{BodyMarkers, Parameter, PatternLabel};

/// Suffixes that mark a binding as an injected collaborator
pub const COLLABORATOR_SUFFIXES: &[&str] =
    &["Service", "Api", "Client", "Repository", "Gateway", "Store"];

/// State-mutation and utility calls tracked as dependencies
pub const TRACKED_CALLS: &[&str] = &[
    "patchState",
    "setState",
    "updateState",
    "firstValueFrom",
    "lastValueFrom",
    "Promise.all",
    "Promise.allSettled",
];

static COLLABORATOR_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\bthis\s*\.\s*)?\b([a-z][A-Za-z0-9_]*(?:Service|Api|Client|Repository|Gateway|Store))\s*\.\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*\(",
    )
    .expect("collaborator regex is valid")
});

static TRACKED_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(patchState|setState|updateState|firstValueFrom|lastValueFrom|Promise\s*\.\s*allSettled|Promise\s*\.\s*all)\s*\(",
    )
    .expect("tracked-call regex is valid")
});

static STATE_PATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\bthis\s*\.\s*)?\b(?:patchState|setState|updateState)\s*\(|\bthis\s*\.\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*\.\s*(?:set|update)\s*\(",
    )
    .expect("state-patch regex is valid")
});

static AWAITED_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*(?::[^=]+)?=\s*await\s+$")
        .expect("awaited-binding regex is valid")
});

static LOADING_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w*[lL]oading\s*(?::|=|\.set\s*\()\s*(true|false)\b")
        .expect("loading regex is valid")
});

static TRY_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\btry\s*\{").expect("try regex is valid")
});

static CATCH_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.\s*catch\s*\(").expect("catch regex is valid")
});

static ROLLBACK_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:roll\s?back|revert|restore|undo)\w*")
        .expect("rollback regex is valid")
});

static PREVIOUS_CAPTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:const|let)\s+(?:previous|prev|snapshot|original|backup)\w*\s*=")
        .expect("capture regex is valid")
});

static AWAIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bawait\b").expect("await regex is valid")
});

static FAN_OUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Promise\s*\.\s*all(?:Settled)?\s*\(|\.\s*(?:map|forEach)\s*\(\s*async\b|\bfor\s*\(\s*(?:const|let)\s+\w+\s+of\b|\bfor\s+await\b",
    )
    .expect("fan-out regex is valid")
});

static BRANCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bif\s*\(|\bswitch\s*\(|\bwhile\s*\(|\bfor\s*\(|\?\s*[^:?.]+\s*:")
        .expect("branch regex is valid")
});

static PROGRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bprogress\w*|\bcompleted\s*\+\+|\bdone\s*\+\+")
        .expect("progress regex is valid")
});

/// A call on an injected collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorCall {
    /// Receiver as written (`this.projectService` or `projectService`)
    pub receiver: String,
    /// Collaborator binding (`projectService`)
    pub collaborator: String,
    /// Method called
    pub method: String,
    /// Full call text including arguments
    pub text: String,
    /// Byte offset in the scanned text
    pub offset: usize,
}

impl CollaboratorCall {
    /// `collaborator.method`
    #[inline]
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.collaborator, self.method)
    }
}

/// A state mutation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePatch {
    /// Byte offset in the scanned text
    pub offset: usize,
    /// Full call text
    pub text: String,
    /// Text of the object literal argument, when there is one
    pub object: Option<String>,
    /// Signal written through `this.<field>.set(...)` / `.update(...)`
    pub signal: Option<String>,
}

impl StatePatch {
    /// Field names this patch writes
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        if let Some(signal) = &self.signal {
            return vec![signal.clone()];
        }
        let Some(object) = &self.object else {
            return Vec::new();
        };
        let inner = object.trim().trim_start_matches('{').trim_end_matches('}');
        top_level_parts(inner)
            .into_iter()
            .filter_map(|part| {
                let key = part.split(':').next()?.trim();
                let key = key.trim_matches(|c| c == '\'' || c == '"');
                let simple = !key.is_empty()
                    && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
                simple.then(|| key.to_string())
            })
            .collect()
    }
}

/// Split on commas that sit outside any delimiter pair
fn top_level_parts(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch, _) in lexical::code_delimiters_and_commas(text) {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Collaborator calls in order of appearance
#[must_use]
pub fn collaborator_calls(text: &str) -> Vec<CollaboratorCall> {
    COLLABORATOR_CALL
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let paren = whole.end() - 1;
            let call = lexical::call_text(text, whole.start(), paren)?;
            let receiver_end = caps.get(1)?.end();
            Some(CollaboratorCall {
                receiver: text[whole.start()..receiver_end].split_whitespace().collect(),
                collaborator: caps[1].to_string(),
                method: caps[2].to_string(),
                text: call.to_string(),
                offset: whole.start(),
            })
        })
        .collect()
}

/// State mutation calls in order of appearance
#[must_use]
pub fn state_patches(text: &str) -> Vec<StatePatch> {
    STATE_PATCH
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let paren = m.end() - 1;
            let close = lexical::matching_close(text, paren)?;
            let signal = caps.get(1).map(|s| s.as_str().to_string());
            let args = &text[paren + 1..close];
            let object = args
                .find('{')
                .filter(|_| signal.is_none())
                .and_then(|open| {
                    let abs = paren + 1 + open;
                    lexical::matching_close(text, abs).map(|end| text[abs..=end].to_string())
                });
            Some(StatePatch {
                offset: m.start(),
                text: text[m.start()..=close].to_string(),
                object,
                signal,
            })
        })
        .collect()
}

/// Body markers: error handling, loading toggle, rollback
#[must_use]
pub fn detect_markers(body: &str) -> BodyMarkers {
    BodyMarkers {
        has_error_handling: TRY_BLOCK.is_match(body) || CATCH_CALL.is_match(body),
        has_loading_toggle: has_loading_toggle(body),
        has_rollback_marker: ROLLBACK_WORD.is_match(body) || PREVIOUS_CAPTURE.is_match(body),
    }
}

/// Whether a loading flag is both set and cleared
#[must_use]
pub fn has_loading_toggle(body: &str) -> bool {
    let mut set = false;
    let mut cleared = false;
    for caps in LOADING_ASSIGN.captures_iter(body) {
        match &caps[1] {
            "true" => set = true,
            _ => cleared = true,
        }
    }
    set && cleared
}

/// Collaborator and tracked calls, deduplicated in first-seen order
#[must_use]
pub fn extract_dependencies(body: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = collaborator_calls(body)
        .into_iter()
        .map(|c| (c.offset, c.qualified_name()))
        .collect();
    found.extend(TRACKED_CALL.captures_iter(body).filter_map(|caps| {
        let m = caps.get(1)?;
        let name: String = m.as_str().split_whitespace().collect();
        Some((m.start(), name))
    }));
    found.sort_by_key(|(offset, _)| *offset);

    let mut deps: Vec<String> = Vec::new();
    for (_, name) in found {
        if !deps.contains(&name) {
            deps.push(name);
        }
    }
    deps
}

/// Number of suspension points
#[inline]
#[must_use]
pub fn count_awaits(body: &str) -> usize {
    AWAIT.find_iter(body).count()
}

/// Number of `try` blocks
#[inline]
#[must_use]
pub fn count_try_blocks(body: &str) -> usize {
    TRY_BLOCK.find_iter(body).count()
}

/// Number of branching constructs
#[inline]
#[must_use]
pub fn count_branches(body: &str) -> usize {
    BRANCH.find_iter(body).count()
}

/// Byte offset of the first `await`
#[inline]
#[must_use]
pub fn first_await(body: &str) -> Option<usize> {
    AWAIT.find(body).map(|m| m.start())
}

/// Whether work is fanned out over a collection
#[inline]
#[must_use]
pub fn has_fan_out(body: &str) -> bool {
    FAN_OUT.is_match(body)
}

/// Whether the body reports progress
#[inline]
#[must_use]
pub fn has_progress_marker(body: &str) -> bool {
    PROGRESS.is_match(body)
}

/// Whether the body captures a previous-state snapshot
#[inline]
#[must_use]
pub fn captures_previous_state(body: &str) -> bool {
    PREVIOUS_CAPTURE.is_match(body)
}

/// Name bound to the awaited result of the expression at `offset`
///
/// Matches `const name = await <expr>` where `<expr>` starts at `offset`.
#[must_use]
pub fn awaited_binding(text: &str, offset: usize) -> Option<&str> {
    let head = text.get(..offset)?;
    AWAITED_BINDING
        .captures(head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Statements that snapshot prior state (`const previous = ...;`)
#[must_use]
pub fn snapshot_statements(body: &str) -> Vec<&str> {
    PREVIOUS_CAPTURE
        .find_iter(body)
        .filter_map(|m| {
            let rest = &body[m.start()..];
            rest.find(';').map(|end| rest[..=end].trim())
        })
        .collect()
}

/// Byte span of the first fan-out construct
///
/// Covers `Promise.all(...)`, `xs.map(async ...)` and `for (... of ...) { ... }`.
#[must_use]
pub fn fan_out_span(body: &str) -> Option<(usize, usize)> {
    let m = FAN_OUT.find(body)?;
    let open = m.start() + body[m.start()..].find('(')?;
    let mut close = lexical::matching_close(body, open)?;
    let after = &body[close + 1..];
    let trimmed = after.trim_start();
    if trimmed.starts_with('{') {
        let brace = close + 1 + (after.len() - trimmed.len());
        close = lexical::matching_close(body, brace)?;
    }
    Some((m.start(), close))
}

/// Per-item binding used when fanning out over `array`
///
/// Recognises `array.map((item) => ...)`, `array.forEach(async item => ...)`
/// and `for (const item of array)`.
#[must_use]
pub fn item_binding<'a>(body: &'a str, array: &str) -> Option<&'a str> {
    let array = regex::escape(array);
    let callback = Regex::new(&format!(
        r"\b{array}\s*\.\s*(?:map|forEach)\s*\(\s*(?:async\s*)?\(?\s*([A-Za-z_$][A-Za-z0-9_$]*)"
    ))
    .ok()?;
    let for_of = Regex::new(&format!(
        r"\bfor\s*\(\s*(?:const|let)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s+of\s+{array}\b"
    ))
    .ok()?;
    callback
        .captures(body)
        .or_else(|| for_of.captures(body))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Coarse label guess; the classifier makes the real decision
#[must_use]
pub fn guess_pattern(params: &[Parameter], body: &str, markers: BodyMarkers) -> PatternLabel {
    if params.iter().any(Parameter::is_array) && has_fan_out(body) {
        PatternLabel::BulkOperation
    } else if markers.has_rollback_marker {
        PatternLabel::OptimisticUpdate
    } else if markers.has_error_handling && !collaborator_calls(body).is_empty() {
        PatternLabel::SimpleLoad
    } else {
        PatternLabel::CustomFallback
    }
}
