//! Maps one raw attribute onto the 0-10 utility scale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::criteria::{CriterionConfig, Direction, Normalization, UTILITY_CEILING};
use super::facts::FactValue;

/// Normalized value of one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizeResult {
    pub value: f64,
    pub is_vetoed: bool,
}

impl NormalizeResult {
    fn vetoed(veto_penalty: f64) -> Self {
        Self {
            value: veto_penalty,
            is_vetoed: true,
        }
    }

    fn unusable(veto_penalty: f64) -> Self {
        Self {
            value: veto_penalty,
            is_vetoed: false,
        }
    }
}

/// Normalize `raw` for `criterion`.
///
/// Unreadable numeric input scores at `veto_penalty` without being flagged as a
/// veto. A crossed veto threshold short-circuits the scoring function.
pub fn normalize(
    raw: &FactValue,
    criterion: &CriterionConfig,
    veto_penalty: f64,
) -> NormalizeResult {
    let working = match &criterion.normalization {
        Normalization::Ordinal { scores } => ordinal_value(raw, scores),
        Normalization::Boolean {
            true_value,
            false_value,
        } => boolean_value(raw, *true_value, *false_value),
        Normalization::Linear { .. } | Normalization::Sigmoid { .. } => {
            let value = raw.as_number();
            if value.is_nan() {
                return NormalizeResult::unusable(veto_penalty);
            }
            value
        }
    };

    if let Some(threshold) = criterion.veto_threshold {
        if crosses_veto(working, threshold, criterion.direction) {
            tracing::debug!(
                criterion = %criterion.id,
                value = working,
                threshold,
                "veto threshold crossed"
            );
            return NormalizeResult::vetoed(veto_penalty);
        }
    }

    let score = match &criterion.normalization {
        Normalization::Linear { min, max } => linear_score(working, *min, *max, criterion.direction),
        Normalization::Sigmoid { k, x0 } => sigmoid_score(working, *k, *x0, criterion.direction),
        Normalization::Ordinal { .. } | Normalization::Boolean { .. } => working,
    };

    NormalizeResult {
        value: clamp_utility(score, veto_penalty),
        is_vetoed: false,
    }
}

/// Clamp a score onto `[veto_penalty, 10]`. `NaN` collapses to the floor.
pub fn clamp_utility(score: f64, veto_penalty: f64) -> f64 {
    if score.is_nan() {
        return veto_penalty;
    }
    score.max(veto_penalty).min(UTILITY_CEILING)
}

fn crosses_veto(value: f64, threshold: f64, direction: Direction) -> bool {
    match direction {
        Direction::Maximize => value < threshold,
        Direction::Minimize => value > threshold,
    }
}

fn ordinal_value(raw: &FactValue, scores: &BTreeMap<String, f64>) -> f64 {
    let Some(label) = raw.as_label() else {
        return 0.0;
    };

    if let Some(score) = scores.get(&label) {
        return *score;
    }

    scores
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(&label))
        .map(|(_, score)| *score)
        .unwrap_or(0.0)
}

fn boolean_value(raw: &FactValue, true_value: f64, false_value: f64) -> f64 {
    if raw.is_truthy() {
        true_value
    } else {
        false_value
    }
}

fn linear_score(value: f64, min: f64, max: f64, direction: Direction) -> f64 {
    if min.is_nan() || max.is_nan() || max <= min {
        return f64::NAN;
    }
    let bounded = value.clamp(min, max);
    let span = max - min;
    match direction {
        Direction::Maximize => (bounded - min) / span * UTILITY_CEILING,
        Direction::Minimize => (max - bounded) / span * UTILITY_CEILING,
    }
}

fn sigmoid_score(value: f64, k: f64, x0: f64, direction: Direction) -> f64 {
    let steepness = match direction {
        Direction::Maximize => k,
        Direction::Minimize => -k.abs(),
    };
    UTILITY_CEILING / (1.0 + (-steepness * (value - x0)).exp())
}
