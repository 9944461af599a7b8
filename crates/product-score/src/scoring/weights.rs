//! Objective (CRITIC) and subjective weight resolution.

use serde::{Deserialize, Serialize};

use super::criteria::{CategoryConfig, MissingStrategy};
use super::facts::{FieldLookup, ProductFacts};
use super::normalizer::normalize;

/// Tolerance used when asserting that a weight set sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Where the final weights came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// CRITIC weights blended with the configured subjective weights.
    Hybrid,
    /// The comparison sample could not support CRITIC; subjective weights only.
    Subjective,
}

/// Per-criterion weights in category order, summing to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWeights {
    pub source: WeightSource,
    pub weights: Vec<f64>,
}

impl ResolvedWeights {
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Scale `weights` in place so they sum to one.
///
/// A set with no positive mass becomes uniform.
pub fn renormalize(weights: &mut [f64]) {
    if weights.is_empty() {
        return;
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        for weight in weights.iter_mut() {
            *weight /= total;
        }
    } else {
        let uniform = 1.0 / weights.len() as f64;
        weights.iter_mut().for_each(|weight| *weight = uniform);
    }
}

/// Configured subjective weights, renormalized.
pub fn subjective_weights(config: &CategoryConfig) -> Vec<f64> {
    let mut weights: Vec<f64> = config
        .criteria
        .iter()
        .map(|criterion| criterion.weight_subjective)
        .collect();
    renormalize(&mut weights);
    weights
}

/// CRITIC weights for a sample matrix of `rows = products`, `columns = criteria`.
///
/// Returns `None` when the sample has fewer than two rows or when no criterion
/// carries any contrast, in which case the objective component is skipped.
pub fn critic_weights(matrix: &[Vec<f64>]) -> Option<Vec<f64>> {
    if matrix.len() < 2 {
        return None;
    }
    let columns = matrix[0].len();
    if columns == 0 || matrix.iter().any(|row| row.len() != columns) {
        return None;
    }

    let series: Vec<Vec<f64>> = (0..columns)
        .map(|column| matrix.iter().map(|row| row[column]).collect())
        .collect();
    let deviations: Vec<f64> = series.iter().map(|values| sample_std_dev(values)).collect();

    let information: Vec<f64> = (0..columns)
        .map(|j| {
            let conflict: f64 = (0..columns)
                .filter(|k| *k != j)
                .map(|k| 1.0 - pearson(&series[j], &series[k], deviations[j], deviations[k]))
                .sum();
            deviations[j] * conflict
        })
        .collect();

    let total: f64 = information.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }

    Some(information.iter().map(|value| value / total).collect())
}

/// Blend CRITIC and subjective weights for `config` over a normalized sample matrix.
pub fn resolve_weights(config: &CategoryConfig, sample: &[Vec<f64>]) -> ResolvedWeights {
    let subjective = subjective_weights(config);

    let Some(objective) = critic_weights(sample) else {
        tracing::debug!(
            category = %config.category_id,
            sample_size = sample.len(),
            "comparison sample cannot support CRITIC weights; using subjective weights"
        );
        return ResolvedWeights {
            source: WeightSource::Subjective,
            weights: subjective,
        };
    };

    let alpha = config.hybrid_alpha;
    let mut weights: Vec<f64> = objective
        .iter()
        .zip(&subjective)
        .map(|(objective, subjective)| alpha * objective + (1.0 - alpha) * subjective)
        .collect();
    renormalize(&mut weights);

    ResolvedWeights {
        source: WeightSource::Hybrid,
        weights,
    }
}

/// Redistribute the weight of excluded criteria across the present ones.
///
/// Excluded positions receive zero. If nothing is present the result is all
/// zeros; if the present criteria carry no weight they share it uniformly.
pub fn reweight_present(weights: &[f64], present: &[bool]) -> Vec<f64> {
    let mut kept: Vec<f64> = weights
        .iter()
        .zip(present)
        .filter(|(_, present)| **present)
        .map(|(weight, _)| *weight)
        .collect();
    renormalize(&mut kept);

    let mut kept = kept.into_iter();
    present
        .iter()
        .map(|present| {
            if *present {
                kept.next().unwrap_or(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Normalize every sample product per criterion for CRITIC.
///
/// Absent `ignore_reweight` cells take the column mean of the present cells;
/// a column with no present cells is filled with zeros.
pub fn sample_matrix(config: &CategoryConfig, sample: &[ProductFacts]) -> Vec<Vec<f64>> {
    let cells: Vec<Vec<Option<f64>>> = sample
        .iter()
        .map(|facts| {
            config
                .criteria
                .iter()
                .map(|criterion| match facts.lookup(&criterion.data_field) {
                    FieldLookup::Found(raw) => {
                        Some(normalize(raw, criterion, config.veto_penalty).value)
                    }
                    FieldLookup::Absent => match criterion.missing_strategy {
                        MissingStrategy::ImputePenalty => Some(
                            normalize(&criterion.impute_value, criterion, config.veto_penalty)
                                .value,
                        ),
                        MissingStrategy::IgnoreReweight => None,
                    },
                })
                .collect()
        })
        .collect();

    let column_means: Vec<f64> = (0..config.criteria.len())
        .map(|column| {
            let present: Vec<f64> = cells.iter().filter_map(|row| row[column]).collect();
            if present.is_empty() {
                0.0
            } else {
                present.iter().sum::<f64>() / present.len() as f64
            }
        })
        .collect();

    cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&column_means)
                .map(|(cell, mean)| cell.unwrap_or(*mean))
                .collect()
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Pearson correlation; a zero-variance series correlates neutrally (0).
fn pearson(x: &[f64], y: &[f64], std_x: f64, std_y: f64) -> f64 {
    if std_x == 0.0 || std_y == 0.0 {
        return 0.0;
    }
    let mean_x = mean(x);
    let mean_y = mean(y);
    let covariance = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum::<f64>()
        / (x.len() - 1) as f64;
    (covariance / (std_x * std_y)).clamp(-1.0, 1.0)
}
