//! rxmig Pattern Classifier
//!
//! Chooses the conversion template for one method. Pure: no I/O and no shared
//! state, so it can be called for any number of files in any order.
//!
//! # Decision
//!
//! - Every rule scores the method independently
//! - Highest score wins; ties go to the earlier rule
//!   (simple-load, optimistic-update, bulk-operation, custom-fallback)
//! - Other rules above the alternative threshold are ranked alternatives
//! - Warnings are the union over every rule, except the review notices of
//!   losing rules
//! - Manual review when the winner is below the review threshold or the
//!   winning rule asks for it

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod rules;
pub mod signals;

pub use rules::{
    default_rules, BulkOperationRule, CustomFallbackRule, OptimisticUpdateRule, RuleOutcome,
    ScoringRule, SimpleLoadRule,
};
pub use signals::{NameVerb, Signals};

use rxmig_core::{Alternative, ClassificationResult, FileContext, MethodRecord, Thresholds};

/// Classify with default thresholds
#[must_use]
pub fn classify(record: &MethodRecord, context: &FileContext) -> ClassificationResult {
    classify_with(record, context, &Thresholds::default())
}

/// Classify with explicit thresholds
#[must_use]
pub fn classify_with(
    record: &MethodRecord,
    context: &FileContext,
    thresholds: &Thresholds,
) -> ClassificationResult {
    let signals = Signals::extract(record);
    let outcomes: Vec<RuleOutcome> = default_rules()
        .iter()
        .map(|rule| rule.score(&signals, context, thresholds))
        .collect();
    decide(record.name(), outcomes, context, thresholds)
}

/// Fold rule outcomes into a result
fn decide(
    name: &str,
    mut outcomes: Vec<RuleOutcome>,
    context: &FileContext,
    thresholds: &Thresholds,
) -> ClassificationResult {
    // Stable sort keeps rule order among equal scores
    outcomes.sort_by(|a, b| b.score.cmp(&a.score));
    let mut ranked = outcomes.into_iter();
    let Some(winner) = ranked.next() else {
        return ClassificationResult {
            label: rxmig_core::PatternLabel::CustomFallback,
            confidence: thresholds.custom_floor,
            alternatives: Vec::new(),
            warnings: vec!["no scoring rules ran".to_string()],
            requires_manual_review: true,
        };
    };

    let mut warnings = winner.warnings.clone();
    let mut alternatives = Vec::new();
    for other in ranked {
        // Losing rules that ask for review only carry review notices
        if !other.manual_review {
            for warning in &other.warnings {
                if !warnings.contains(warning) {
                    warnings.push(warning.clone());
                }
            }
        }
        if other.score > thresholds.alternative {
            alternatives.push(Alternative {
                label: other.label,
                confidence: other.score,
                reason: other.reason,
            });
        }
    }

    if context.is_converted(name) {
        warnings.push(format!(
            "'{name}' already has a reactive-pipeline form; converting again may shadow it"
        ));
    }
    if let Some(strong) = thresholds.strong_match(winner.label) {
        if winner.score < strong {
            warnings.push(format!(
                "low confidence for {}: {} is below the strong-match score {}",
                winner.label, winner.score, strong
            ));
        }
    }

    let requires_manual_review = winner.score < thresholds.manual_review || winner.manual_review;
    tracing::trace!(
        method = name,
        label = %winner.label,
        confidence = winner.score,
        reason = %winner.reason,
        "classified method"
    );

    ClassificationResult {
        label: winner.label,
        confidence: winner.score,
        alternatives,
        warnings,
        requires_manual_review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxmig_core::PatternLabel;

    fn outcome(label: PatternLabel, score: u8) -> RuleOutcome {
        RuleOutcome {
            label,
            score,
            reason: format!("{label} reason"),
            warnings: Vec::new(),
            manual_review: label == PatternLabel::CustomFallback,
        }
    }

    #[test]
    fn ties_go_to_rule_order() {
        let result = decide(
            "x",
            vec![
                outcome(PatternLabel::SimpleLoad, 50),
                outcome(PatternLabel::OptimisticUpdate, 50),
                outcome(PatternLabel::BulkOperation, 10),
                outcome(PatternLabel::CustomFallback, 20),
            ],
            &FileContext::default(),
            &Thresholds::default(),
        );
        assert_eq!(result.label, PatternLabel::SimpleLoad);
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].label, PatternLabel::OptimisticUpdate);
        assert!(result.requires_manual_review);
    }

    #[test]
    fn alternatives_are_ranked_descending() {
        let result = decide(
            "x",
            vec![
                outcome(PatternLabel::SimpleLoad, 40),
                outcome(PatternLabel::OptimisticUpdate, 90),
                outcome(PatternLabel::BulkOperation, 55),
                outcome(PatternLabel::CustomFallback, 30),
            ],
            &FileContext::default(),
            &Thresholds::default(),
        );
        assert_eq!(result.label, PatternLabel::OptimisticUpdate);
        let alts: Vec<_> = result.alternatives.iter().map(|a| a.confidence).collect();
        assert_eq!(alts, vec![55, 40]);
        assert!(!result.requires_manual_review);
    }

    #[test]
    fn losing_custom_notice_is_not_carried() {
        let mut custom = outcome(PatternLabel::CustomFallback, 20);
        custom.warnings.push("manual review required".to_string());
        let result = decide(
            "x",
            vec![outcome(PatternLabel::SimpleLoad, 95), custom],
            &FileContext::default(),
            &Thresholds::default(),
        );
        assert!(result.warnings.is_empty());
        assert!(!result.requires_manual_review);
    }

    #[test]
    fn losing_rule_warnings_are_kept() {
        let mut optimistic = outcome(PatternLabel::OptimisticUpdate, 5);
        optimistic
            .warnings
            .push("apply/rollback fields could not be inferred".to_string());
        let mut bulk = outcome(PatternLabel::BulkOperation, 0);
        bulk.warnings
            .push("no array parameter; falls back to the single-call shape".to_string());
        bulk.warnings
            .push("apply/rollback fields could not be inferred".to_string());
        let result = decide(
            "x",
            vec![outcome(PatternLabel::SimpleLoad, 100), optimistic, bulk],
            &FileContext::default(),
            &Thresholds::default(),
        );
        assert!(result.alternatives.is_empty());
        assert_eq!(
            result.warnings,
            vec![
                "apply/rollback fields could not be inferred".to_string(),
                "no array parameter; falls back to the single-call shape".to_string(),
            ]
        );
    }

    #[test]
    fn converted_name_warns() {
        let mut ctx = FileContext::default();
        ctx.converted_methods.insert("load".to_string());
        let result = decide(
            "load",
            vec![outcome(PatternLabel::SimpleLoad, 95)],
            &ctx,
            &Thresholds::default(),
        );
        assert!(result.warnings[0].contains("already has a reactive-pipeline form"));
    }

    #[test]
    fn low_confidence_warning() {
        let result = decide(
            "x",
            vec![outcome(PatternLabel::BulkOperation, 62)],
            &FileContext::default(),
            &Thresholds::default(),
        );
        assert!(result.warnings.iter().any(|w| w.contains("low confidence")));
        assert!(!result.requires_manual_review);
    }
}
