//! Scoring rules, one per pattern label
//!
//! Each rule adds weight for its own indicators and subtracts weight for
//! indicators that belong to competing labels. Scores clamp to `[0, 100]`.

use crate::signals::{NameVerb, Signals};
use rxmig_core::{FileContext, PatternLabel, Thresholds};

/// What one rule concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Label the rule scores
    pub label: PatternLabel,
    /// Score in `[0, 100]`
    pub score: u8,
    /// Indicators that contributed, joined for display
    pub reason: String,
    /// Non-blocking notes about the generated output
    pub warnings: Vec<String>,
    /// Whether output from this rule needs a human pass
    pub manual_review: bool,
}

/// A scoring rule
pub trait ScoringRule: Send + Sync + std::fmt::Debug {
    /// Label this rule scores
    fn label(&self) -> PatternLabel;

    /// Score a method
    fn score(&self, signals: &Signals, context: &FileContext, thresholds: &Thresholds)
        -> RuleOutcome;
}

/// Additive score with the indicators that fired
#[derive(Debug, Default)]
struct Tally {
    score: i32,
    reasons: Vec<String>,
}

impl Tally {
    fn add(&mut self, fired: bool, weight: i32, reason: &str) {
        if fired {
            self.score += weight;
            if weight >= 0 {
                self.reasons.push(format!("+{weight} {reason}"));
            } else {
                self.reasons.push(format!("{weight} {reason}"));
            }
        }
    }

    fn outcome(self, label: PatternLabel) -> RuleOutcome {
        RuleOutcome {
            label,
            score: clamp(self.score),
            reason: if self.reasons.is_empty() {
                "no indicators".to_string()
            } else {
                self.reasons.join(", ")
            },
            warnings: Vec::new(),
            manual_review: false,
        }
    }
}

#[inline]
fn clamp(score: i32) -> u8 {
    u8::try_from(score.clamp(0, 100)).unwrap_or(100)
}

/// One collaborator call wrapped in error handling and a loading toggle
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleLoadRule;

impl ScoringRule for SimpleLoadRule {
    fn label(&self) -> PatternLabel {
        PatternLabel::SimpleLoad
    }

    fn score(&self, s: &Signals, context: &FileContext, _: &Thresholds) -> RuleOutcome {
        let mut tally = Tally::default();
        tally.add(s.collaborator_calls >= 1, 30, "collaborator call");
        tally.add(s.error_handling, 25, "error handling");
        tally.add(s.loading_toggle, 20, "loading toggle");
        tally.add(s.await_count == 1, 15, "single suspension point");
        tally.add(s.verb == NameVerb::Load, 10, "load-style name");
        tally.add(s.array_param && s.fan_out, -30, "array fan-out");
        tally.add(s.rollback_marker, -25, "rollback marker");
        tally.add(s.await_count > 2, -20, "many suspension points");
        tally.add(s.branches > 2, -15, "branching");
        tally.add(s.try_blocks > 1, -10, "multiple try blocks");

        let mut outcome = tally.outcome(self.label());
        if s.collaborator_calls == 0 {
            outcome
                .warnings
                .push("no collaborator call detected; the request stage is a stub".to_string());
        }
        if !context.has_loading_flag() {
            outcome.warnings.push(format!(
                "no loading field declared in state; '{}' will be patched",
                context.loading_field_or_default()
            ));
        }
        outcome
    }
}

/// Local mutation first, remote call second, rollback on failure
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimisticUpdateRule;

impl ScoringRule for OptimisticUpdateRule {
    fn label(&self) -> PatternLabel {
        PatternLabel::OptimisticUpdate
    }

    fn score(&self, s: &Signals, _: &FileContext, _: &Thresholds) -> RuleOutcome {
        let mut tally = Tally::default();
        tally.add(s.rollback_marker, 35, "rollback marker");
        tally.add(s.captures_previous, 25, "previous-state capture");
        tally.add(s.mutation_before_await, 20, "mutation before first suspension");
        tally.add(s.verb == NameVerb::Mutate, 10, "mutation-style name");
        tally.add(s.error_handling, 10, "error handling");
        tally.add(s.loading_toggle, -15, "loading toggle");
        tally.add(s.fan_out, -30, "fan-out");

        let mut outcome = tally.outcome(self.label());
        if !s.mutation_before_await || !s.rollback_patch {
            outcome.warnings.push(
                "optimistic apply/rollback fields could not be inferred; stubs are marked for review"
                    .to_string(),
            );
        }
        outcome
    }
}

/// An array parameter fanned out into per-item calls
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkOperationRule;

impl ScoringRule for BulkOperationRule {
    fn label(&self) -> PatternLabel {
        PatternLabel::BulkOperation
    }

    fn score(&self, s: &Signals, _: &FileContext, _: &Thresholds) -> RuleOutcome {
        let mut tally = Tally::default();
        tally.add(s.array_param, 40, "array parameter");
        tally.add(s.fan_out && s.array_param, 30, "fan-out over the array");
        tally.add(s.fan_out && !s.array_param, 10, "fan-out");
        tally.add(s.verb == NameVerb::Bulk, 10, "bulk-style name");
        tally.add(s.progress, 10, "progress reporting");
        tally.add(s.rollback_marker, -20, "rollback marker");

        let mut outcome = tally.outcome(self.label());
        if s.fan_out {
            outcome.warnings.push(
                "fan-out is unbounded: every element is requested concurrently".to_string(),
            );
        }
        if !s.array_param {
            outcome
                .warnings
                .push("no array parameter; falls back to the single-call shape".to_string());
        }
        outcome
    }
}

/// Last resort: scaffolding plus the original body as comments
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomFallbackRule;

impl CustomFallbackRule {
    /// Fixed cost of emitting a generic template
    pub const BASE_PENALTY: u32 = 50;

    /// Complexity penalty for a method
    #[must_use]
    pub fn penalty(s: &Signals) -> u32 {
        let length = u32::try_from(s.body_lines / 5).unwrap_or(u32::MAX).min(20);
        let suspensions = u32::try_from(s.await_count.saturating_sub(1) * 5)
            .unwrap_or(u32::MAX)
            .min(15);
        let try_blocks = if s.try_blocks > 1 { 10 } else { 0 };
        let branches = u32::try_from(s.branches * 5).unwrap_or(u32::MAX).min(15);
        Self::BASE_PENALTY + length + suspensions + try_blocks + branches
    }
}

impl ScoringRule for CustomFallbackRule {
    fn label(&self) -> PatternLabel {
        PatternLabel::CustomFallback
    }

    fn score(&self, s: &Signals, _: &FileContext, thresholds: &Thresholds) -> RuleOutcome {
        let penalty = Self::penalty(s);
        let raw = 100u32.saturating_sub(penalty);
        let score = u8::try_from(raw)
            .unwrap_or(100)
            .max(thresholds.custom_floor)
            .min(100);
        RuleOutcome {
            label: self.label(),
            score,
            reason: format!("complexity penalty {penalty}"),
            warnings: vec![
                "manual review required: original body is embedded as comments".to_string(),
            ],
            manual_review: true,
        }
    }
}

/// The built-in rules in tie-break order
#[must_use]
pub fn default_rules() -> Vec<Box<dyn ScoringRule>> {
    vec![
        Box::new(SimpleLoadRule),
        Box::new(OptimisticUpdateRule),
        Box::new(BulkOperationRule),
        Box::new(CustomFallbackRule),
    ]
}
