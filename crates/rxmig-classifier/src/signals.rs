//! Signals extracted from a method record
//!
//! Rules never look at text directly; they only consume these booleans and
//! counts, so detection can change without touching the scoring contract.

use rxmig_core::MethodRecord;
use rxmig_scanner::context::{is_error_name, is_loading_name};
use rxmig_scanner::detectors;

/// What the method name suggests it does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameVerb {
    /// `load…`, `fetch…`, `get…`, `refresh…`
    Load,
    /// `update…`, `toggle…`, `delete…`, `remove…`, `save…`, …
    Mutate,
    /// `bulk…`, `batch…`, `…All`, `…Many`
    Bulk,
    /// Anything else
    Other,
}

impl NameVerb {
    /// Classify a method name
    #[must_use]
    pub fn of(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let starts = |prefixes: &[&str]| prefixes.iter().any(|p| lower.starts_with(p));
        if starts(&["bulk", "batch"]) || name.ends_with("All") || name.ends_with("Many") {
            NameVerb::Bulk
        } else if starts(&["load", "fetch", "get", "refresh", "reload"]) {
            NameVerb::Load
        } else if starts(&[
            "update", "toggle", "delete", "remove", "save", "add", "create", "set", "rename",
            "move",
        ]) {
            NameVerb::Mutate
        } else {
            NameVerb::Other
        }
    }
}

/// Countable and boolean facts about one method
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Signals {
    /// Number of `await` expressions
    pub await_count: usize,
    /// Number of collaborator calls
    pub collaborator_calls: usize,
    /// Number of `try` blocks
    pub try_blocks: usize,
    /// Number of branching constructs
    pub branches: usize,
    /// Lines spanned by the body
    pub body_lines: usize,
    /// `try`/`catch` or `.catch(`
    pub error_handling: bool,
    /// Loading flag set and cleared
    pub loading_toggle: bool,
    /// Rollback wording or previous-state capture
    pub rollback_marker: bool,
    /// Snapshot of prior state taken into a local
    pub captures_previous: bool,
    /// State patched before the first `await`, excluding loading/error flags
    pub mutation_before_await: bool,
    /// State patched inside a `catch`
    pub rollback_patch: bool,
    /// Some parameter is array-typed
    pub array_param: bool,
    /// Work fanned out over a collection
    pub fan_out: bool,
    /// Progress is reported
    pub progress: bool,
    /// Name verb
    pub verb: NameVerb,
}

impl Signals {
    /// Derive signals from a record
    #[must_use]
    pub fn extract(record: &MethodRecord) -> Self {
        let body = record.body();
        let markers = record.markers();
        let first_await = detectors::first_await(body);
        let patches = detectors::state_patches(body);
        let catch_at = body.find("catch");

        let mutation_before_await = patches.iter().any(|p| {
            first_await.is_some_and(|aw| p.offset < aw)
                && p.fields()
                    .iter()
                    .any(|f| !is_loading_name(f) && !is_error_name(f))
        });
        let rollback_patch = catch_at.is_some_and(|c| patches.iter().any(|p| p.offset > c));

        Self {
            await_count: detectors::count_awaits(body),
            collaborator_calls: detectors::collaborator_calls(body).len(),
            try_blocks: detectors::count_try_blocks(body),
            branches: detectors::count_branches(body),
            body_lines: body.lines().count(),
            error_handling: markers.has_error_handling,
            loading_toggle: markers.has_loading_toggle,
            rollback_marker: markers.has_rollback_marker,
            captures_previous: detectors::captures_previous_state(body),
            mutation_before_await,
            rollback_patch,
            array_param: record.array_param().is_some(),
            fan_out: detectors::has_fan_out(body),
            progress: detectors::has_progress_marker(body),
            verb: NameVerb::of(record.name()),
        }
    }
}
