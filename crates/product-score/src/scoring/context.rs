//! Usage contexts that re-weight, adjust, or disqualify a base score.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::aggregator::utility_score;
use super::criteria::CategoryConfig;
use super::facts::FactValue;
use super::normalizer::clamp_utility;
use super::result::{AggregateScore, BreakdownEntry, ContextScore, UnifiedScoringResult};
use super::weights::renormalize;

fn default_weight() -> f64 {
    1.0
}

/// One selectable usage scenario of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub name: String,
    /// Contexts sharing any group tag cannot be selected together.
    #[serde(default)]
    pub exclusion_groups: Vec<String>,
    /// Share of this context in a multi-context geometric mean.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub deltas: Vec<DeltaRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal: Option<FatalRule>,
}

/// Per-criterion adjustment applied while a context is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRule {
    pub criterion_id: String,
    #[serde(default = "default_weight")]
    pub weight_multiplier: f64,
    /// Shift on the 0-10 normalized scale.
    #[serde(default)]
    pub value_shift: f64,
    /// Restricts the rule to these regions; empty means everywhere.
    #[serde(default)]
    pub regions: Vec<String>,
}

impl DeltaRule {
    fn applies_to(&self, settings: &ScoringSettings) -> bool {
        if self.regions.is_empty() {
            return true;
        }
        settings.region.as_deref().is_some_and(|region| {
            self.regions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(region))
        })
    }
}

/// Hard incompatibility that eliminates a product for a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatalRule {
    pub criterion_id: String,
    pub condition: FatalCondition,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FatalCondition {
    Above(f64),
    Below(f64),
    Equals(FactValue),
    Vetoed,
}

impl FatalRule {
    fn fires(&self, breakdown: &[BreakdownEntry]) -> bool {
        let Some(entry) = breakdown
            .iter()
            .find(|entry| entry.criterion_id == self.criterion_id)
        else {
            return false;
        };

        match &self.condition {
            FatalCondition::Vetoed => entry.is_vetoed,
            FatalCondition::Above(limit) => entry
                .raw_value
                .as_ref()
                .map(FactValue::as_number)
                .is_some_and(|value| value > *limit),
            FatalCondition::Below(limit) => entry
                .raw_value
                .as_ref()
                .map(FactValue::as_number)
                .is_some_and(|value| value < *limit),
            FatalCondition::Equals(expected) => entry
                .raw_value
                .as_ref()
                .is_some_and(|value| facts_equal(value, expected)),
        }
    }
}

fn facts_equal(actual: &FactValue, expected: &FactValue) -> bool {
    match (actual, expected) {
        (FactValue::Text(a), FactValue::Text(b)) => a.eq_ignore_ascii_case(b),
        (a, b) => a == b,
    }
}

/// Regional or user settings read by context delta rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub region: Option<String>,
}

/// The selected contexts cannot be combined; the caller must drop one and retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("selected contexts are mutually exclusive: {}", conflicting_contexts.join(", "))]
pub struct MutualExclusionError {
    pub conflicting_contexts: Vec<String>,
}

/// Adjust a base score for the selected contexts.
///
/// Unknown and repeated context ids are skipped. Mutually exclusive selections
/// abort the call before any score is produced.
pub fn apply_contexts(
    base: AggregateScore,
    selected_ids: &[String],
    contexts: &[Context],
    settings: &ScoringSettings,
    veto_penalty: f64,
) -> Result<UnifiedScoringResult, MutualExclusionError> {
    let selected = resolve_selection(selected_ids, contexts);
    validate_exclusions(&selected)?;

    if selected.is_empty() {
        return Ok(UnifiedScoringResult::from_base(base));
    }

    let context_scores: Vec<ContextScore> = selected
        .iter()
        .map(|context| ContextScore {
            context_id: context.id.clone(),
            score: utility_score(
                &adjust_breakdown(&base.breakdown, context, settings, veto_penalty),
                veto_penalty,
            ),
            weight: context.weight,
        })
        .collect();

    let context_ids: Vec<String> = selected.iter().map(|context| context.id.clone()).collect();
    let base_score = base.score;
    let mut result = UnifiedScoringResult::from_base(base);
    result.context_ids = context_ids;
    result.context_scores = context_scores;

    let fatal = selected.iter().find_map(|context| {
        context
            .fatal
            .as_ref()
            .filter(|rule| rule.fires(&result.breakdown))
            .map(|rule| format!("{}: {}", context.name, rule.reason))
    });
    if let Some(reason) = fatal {
        tracing::debug!(%reason, "context eliminated product");
        result.is_fatal = true;
        result.fatal_reason = Some(reason);
        result.final_score = 0.0;
        result.contextual_score = Some(0.0);
        result.delta = -base_score;
        return Ok(result);
    }

    let contextual = combine_scores(&result.context_scores);
    result.final_score = contextual;
    result.contextual_score = Some(contextual);
    result.delta = contextual - base_score;
    Ok(result)
}

/// Weighted geometric mean of per-context scores.
///
/// A single context passes through unchanged. Non-positive total weight falls
/// back to equal weights.
pub fn combine_scores(scores: &[ContextScore]) -> f64 {
    match scores {
        [] => 0.0,
        [only] => only.score,
        many => {
            let total: f64 = many.iter().map(|score| score.weight).sum();
            let equal = 1.0 / many.len() as f64;
            many.iter()
                .map(|score| {
                    let exponent = if total > 0.0 {
                        score.weight / total
                    } else {
                        equal
                    };
                    score.score.powf(exponent)
                })
                .product()
        }
    }
}

fn resolve_selection<'a>(selected_ids: &[String], contexts: &'a [Context]) -> Vec<&'a Context> {
    let mut seen = HashSet::new();
    selected_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .filter_map(|id| {
            let found = contexts.iter().find(|context| &context.id == id);
            if found.is_none() {
                tracing::warn!(context_id = %id, "ignoring unknown context");
            }
            found
        })
        .collect()
}

fn validate_exclusions(selected: &[&Context]) -> Result<(), MutualExclusionError> {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for context in selected {
        for group in &context.exclusion_groups {
            groups
                .entry(group.as_str())
                .or_default()
                .push(context.id.as_str());
        }
    }

    let conflicting: HashSet<&str> = groups
        .values()
        .filter(|members| members.len() > 1)
        .flatten()
        .copied()
        .collect();
    if conflicting.is_empty() {
        return Ok(());
    }

    Err(MutualExclusionError {
        conflicting_contexts: selected
            .iter()
            .filter(|context| conflicting.contains(context.id.as_str()))
            .map(|context| context.id.clone())
            .collect(),
    })
}

fn adjust_breakdown(
    breakdown: &[BreakdownEntry],
    context: &Context,
    settings: &ScoringSettings,
    veto_penalty: f64,
) -> Vec<BreakdownEntry> {
    let mut adjusted = breakdown.to_vec();
    for rule in context.deltas.iter().filter(|rule| rule.applies_to(settings)) {
        for entry in adjusted
            .iter_mut()
            .filter(|entry| entry.criterion_id == rule.criterion_id)
        {
            entry.weight *= rule.weight_multiplier;
            if !entry.is_vetoed {
                entry.normalized_value =
                    clamp_utility(entry.normalized_value + rule.value_shift, veto_penalty);
            }
        }
    }

    let mut weights: Vec<f64> = adjusted.iter().map(|entry| entry.weight).collect();
    renormalize(&mut weights);
    for (entry, weight) in adjusted.iter_mut().zip(weights) {
        entry.weight = weight;
        entry.contribution = weight * entry.normalized_value;
    }
    adjusted
}

/// Rejected context definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextConfigError {
    #[error("context '{0}' is defined more than once")]
    DuplicateContext(String),
    #[error("context '{context_id}' references unknown criterion '{criterion_id}'")]
    UnknownCriterion {
        context_id: String,
        criterion_id: String,
    },
    #[error("context '{context_id}' has invalid weight {weight}")]
    InvalidWeight { context_id: String, weight: f64 },
    #[error("context '{context_id}' has an invalid delta for '{criterion_id}'")]
    InvalidDelta {
        context_id: String,
        criterion_id: String,
    },
}

/// Check context definitions against their category. Run once at load time.
pub fn validate_contexts(
    config: &CategoryConfig,
    contexts: &[Context],
) -> Result<(), ContextConfigError> {
    let mut seen = HashSet::new();
    for context in contexts {
        if !seen.insert(context.id.as_str()) {
            return Err(ContextConfigError::DuplicateContext(context.id.clone()));
        }
        if !(context.weight.is_finite() && context.weight > 0.0) {
            return Err(ContextConfigError::InvalidWeight {
                context_id: context.id.clone(),
                weight: context.weight,
            });
        }

        let referenced = context
            .deltas
            .iter()
            .map(|rule| rule.criterion_id.as_str())
            .chain(context.fatal.iter().map(|rule| rule.criterion_id.as_str()));
        for criterion_id in referenced {
            if config.criterion(criterion_id).is_none() {
                return Err(ContextConfigError::UnknownCriterion {
                    context_id: context.id.clone(),
                    criterion_id: criterion_id.to_string(),
                });
            }
        }

        for rule in &context.deltas {
            let multiplier_ok = rule.weight_multiplier.is_finite() && rule.weight_multiplier >= 0.0;
            if !multiplier_ok || !rule.value_shift.is_finite() {
                return Err(ContextConfigError::InvalidDelta {
                    context_id: context.id.clone(),
                    criterion_id: rule.criterion_id.clone(),
                });
            }
        }
    }
    Ok(())
}
