use serde::{Deserialize, Serialize};

use super::facts::FactValue;
use super::weights::WeightSource;

/// Per-criterion line of a score explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub criterion_id: String,
    pub label: String,
    /// Raw attribute as read from the product; `None` when it was imputed.
    pub raw_value: Option<FactValue>,
    pub imputed: bool,
    pub normalized_value: f64,
    pub weight: f64,
    pub is_vetoed: bool,
    /// Weighted points on the 0-10 scale (`weight * normalized_value`).
    pub contribution: f64,
}

/// Vetoed criterion surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub criterion_id: String,
    pub label: String,
    pub reason: String,
}

/// Criterion called out as a strength or weakness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub criterion_id: String,
    pub label: String,
    pub normalized_value: f64,
    pub contribution: f64,
    pub is_vetoed: bool,
}

impl Highlight {
    pub(crate) fn from_entry(entry: &BreakdownEntry) -> Self {
        Self {
            criterion_id: entry.criterion_id.clone(),
            label: entry.label.clone(),
            normalized_value: entry.normalized_value,
            contribution: entry.contribution,
            is_vetoed: entry.is_vetoed,
        }
    }
}

/// Base score of one product before any context is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub score: f64,
    pub weight_source: WeightSource,
    pub breakdown: Vec<BreakdownEntry>,
    /// Criteria left out because the attribute was missing and the criterion reweights.
    pub excluded_criteria: Vec<String>,
    pub penalties: Vec<Penalty>,
    pub strengths: Vec<Highlight>,
    pub weaknesses: Vec<Highlight>,
}

/// Score of one product for one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextScore {
    pub context_id: String,
    pub score: f64,
    pub weight: f64,
}

/// Final answer of one scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedScoringResult {
    pub final_score: f64,
    pub base_score: f64,
    /// Present only when at least one context was applied.
    pub contextual_score: Option<f64>,
    pub delta: f64,
    pub context_ids: Vec<String>,
    pub context_scores: Vec<ContextScore>,
    pub is_fatal: bool,
    pub fatal_reason: Option<String>,
    pub weight_source: WeightSource,
    pub breakdown: Vec<BreakdownEntry>,
    pub excluded_criteria: Vec<String>,
    pub penalties: Vec<Penalty>,
    pub strengths: Vec<Highlight>,
    pub weaknesses: Vec<Highlight>,
}

impl UnifiedScoringResult {
    pub fn from_base(base: AggregateScore) -> Self {
        Self {
            final_score: base.score,
            base_score: base.score,
            contextual_score: None,
            delta: 0.0,
            context_ids: Vec::new(),
            context_scores: Vec::new(),
            is_fatal: false,
            fatal_reason: None,
            weight_source: base.weight_source,
            breakdown: base.breakdown,
            excluded_criteria: base.excluded_criteria,
            penalties: base.penalties,
            strengths: base.strengths,
            weaknesses: base.weaknesses,
        }
    }

    pub fn has_vetoes(&self) -> bool {
        !self.penalties.is_empty()
    }

    /// One-line explanation for listing views.
    pub fn summary(&self) -> String {
        if self.is_fatal {
            return match &self.fatal_reason {
                Some(reason) => format!("disqualified: {reason}"),
                None => "disqualified for the selected contexts".to_string(),
            };
        }
        if self.context_ids.is_empty() {
            format!("score {:.2}", self.final_score)
        } else {
            format!(
                "score {:.2} ({:+.2} for {})",
                self.final_score,
                self.delta,
                self.context_ids.join(", ")
            )
        }
    }
}
