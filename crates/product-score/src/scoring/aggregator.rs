//! Multiplicative utility aggregation.
//!
//! `U = prod(u_j ^ w_j)` with `u_j = x'_j / 10`. A vetoed criterion sits at the
//! veto penalty, so its factor drags the whole product toward zero in
//! proportion to its weight.

use std::cmp::Ordering;

use super::criteria::{
    CategoryConfig, CriterionConfig, Direction, MissingStrategy, UTILITY_CEILING,
};
use super::facts::{FactValue, FieldLookup, ProductFacts};
use super::normalizer::normalize;
use super::result::{AggregateScore, BreakdownEntry, Highlight, Penalty};
use super::weights::{reweight_present, ResolvedWeights};

/// Contribution, per equal weight share, at or above which a criterion counts
/// as a strength.
pub const STRENGTH_THRESHOLD: f64 = 7.0;
/// Contribution, per equal weight share, at or below which a criterion counts
/// as a weakness.
pub const WEAKNESS_THRESHOLD: f64 = 4.0;
const HIGHLIGHT_LIMIT: usize = 3;

/// Score one product against `config` using already resolved weights.
pub fn aggregate(
    facts: &ProductFacts,
    config: &CategoryConfig,
    weights: &ResolvedWeights,
) -> AggregateScore {
    let resolved: Vec<Option<(Option<FactValue>, FactValue)>> = config
        .criteria
        .iter()
        .map(|criterion| resolve_raw(facts, criterion))
        .collect();

    let present: Vec<bool> = resolved.iter().map(Option::is_some).collect();
    let effective = reweight_present(&weights.weights, &present);

    let mut breakdown = Vec::new();
    let mut excluded_criteria = Vec::new();
    let mut penalties = Vec::new();

    for ((criterion, raw), weight) in config.criteria.iter().zip(resolved).zip(effective) {
        let Some((observed, input)) = raw else {
            excluded_criteria.push(criterion.id.clone());
            continue;
        };

        let normalized = normalize(&input, criterion, config.veto_penalty);
        if normalized.is_vetoed {
            penalties.push(Penalty {
                criterion_id: criterion.id.clone(),
                label: criterion.label.clone(),
                reason: veto_reason(criterion, &input),
            });
        }

        breakdown.push(BreakdownEntry {
            criterion_id: criterion.id.clone(),
            label: criterion.label.clone(),
            imputed: observed.is_none(),
            raw_value: observed,
            normalized_value: normalized.value,
            weight,
            is_vetoed: normalized.is_vetoed,
            contribution: weight * normalized.value,
        });
    }

    let score = utility_score(&breakdown, config.veto_penalty);
    let strengths = strengths(&breakdown);
    let weaknesses = weaknesses(&breakdown);

    AggregateScore {
        score,
        weight_source: weights.source,
        breakdown,
        excluded_criteria,
        penalties,
        strengths,
        weaknesses,
    }
}

/// Multiplicative utility of a breakdown on the 0-10 scale.
///
/// An empty breakdown has no evidence and scores at the floor.
pub fn utility_score(breakdown: &[BreakdownEntry], veto_penalty: f64) -> f64 {
    if breakdown.is_empty() {
        return veto_penalty;
    }
    let log_utility: f64 = breakdown
        .iter()
        .map(|entry| {
            let utility = (entry.normalized_value / UTILITY_CEILING).clamp(f64::MIN_POSITIVE, 1.0);
            entry.weight * utility.ln()
        })
        .sum();
    log_utility.exp() * UTILITY_CEILING
}

/// Raw attribute and the value to normalize; `None` when the criterion drops out.
fn resolve_raw(
    facts: &ProductFacts,
    criterion: &CriterionConfig,
) -> Option<(Option<FactValue>, FactValue)> {
    match facts.lookup(&criterion.data_field) {
        FieldLookup::Found(value) => Some((Some(value.clone()), value.clone())),
        FieldLookup::Absent => match criterion.missing_strategy {
            MissingStrategy::ImputePenalty => Some((None, criterion.impute_value.clone())),
            MissingStrategy::IgnoreReweight => None,
        },
    }
}

fn veto_reason(criterion: &CriterionConfig, input: &FactValue) -> String {
    let threshold = criterion.veto_threshold.unwrap_or_default();
    let bound = match criterion.direction {
        Direction::Maximize => "below minimum",
        Direction::Minimize => "above maximum",
    };
    format!("{} {input} is {bound} {threshold}", criterion.label)
}

/// Contribution of a criterion holding `1/n` of the weight at `value`.
///
/// With equal weights this reduces to comparing normalized values against the
/// thresholds; a lightly weighted criterion needs a proportionally higher value.
fn share_of(breakdown: &[BreakdownEntry], value: f64) -> f64 {
    value / breakdown.len().max(1) as f64
}

fn strengths(breakdown: &[BreakdownEntry]) -> Vec<Highlight> {
    let floor = share_of(breakdown, STRENGTH_THRESHOLD);
    let mut candidates: Vec<&BreakdownEntry> = breakdown
        .iter()
        .filter(|entry| !entry.is_vetoed && entry.contribution >= floor)
        .collect();
    candidates.sort_by(|a, b| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(Ordering::Equal)
    });
    candidates
        .into_iter()
        .take(HIGHLIGHT_LIMIT)
        .map(Highlight::from_entry)
        .collect()
}

fn weaknesses(breakdown: &[BreakdownEntry]) -> Vec<Highlight> {
    let ceiling = share_of(breakdown, WEAKNESS_THRESHOLD);
    let mut candidates: Vec<&BreakdownEntry> = breakdown
        .iter()
        .filter(|entry| entry.is_vetoed || entry.contribution <= ceiling)
        .collect();
    candidates.sort_by(|a, b| {
        b.is_vetoed.cmp(&a.is_vetoed).then_with(|| {
            a.contribution
                .partial_cmp(&b.contribution)
                .unwrap_or(Ordering::Equal)
        })
    });
    candidates
        .into_iter()
        .take(HIGHLIGHT_LIMIT)
        .map(Highlight::from_entry)
        .collect()
}
