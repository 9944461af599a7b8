use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::facts::FactValue;

/// Upper bound of the normalized utility scale.
pub const UTILITY_CEILING: f64 = 10.0;

/// Whether higher raw values are better or worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Maximize,
    Minimize,
}

/// How a criterion is scored when the product lacks the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    #[default]
    ImputePenalty,
    IgnoreReweight,
}

/// Scoring function applied to a raw attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Normalization {
    Linear {
        min: f64,
        max: f64,
    },
    Sigmoid {
        k: f64,
        x0: f64,
    },
    Ordinal {
        scores: BTreeMap<String, f64>,
    },
    Boolean {
        #[serde(default = "default_true_value")]
        true_value: f64,
        #[serde(default = "default_false_value")]
        false_value: f64,
    },
}

fn default_true_value() -> f64 {
    10.0
}

fn default_false_value() -> f64 {
    5.0
}

fn default_impute_value() -> FactValue {
    FactValue::Number(0.0)
}

/// One scored dimension of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub id: String,
    pub label: String,
    /// Dot-path into the product facts.
    pub data_field: String,
    pub weight_subjective: f64,
    pub direction: Direction,
    #[serde(default)]
    pub missing_strategy: MissingStrategy,
    #[serde(default = "default_impute_value")]
    pub impute_value: FactValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veto_threshold: Option<f64>,
    pub normalization: Normalization,
}

/// A category's complete scoring rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub category_id: String,
    /// Share of the objective (CRITIC) weight in the hybrid blend.
    pub hybrid_alpha: f64,
    pub veto_penalty: f64,
    pub criteria: Vec<CriterionConfig>,
}

impl CategoryConfig {
    pub fn criterion(&self, id: &str) -> Option<&CriterionConfig> {
        self.criteria.iter().find(|criterion| criterion.id == id)
    }

    /// Check the invariants the engine relies on. Run once when a category is loaded.
    pub fn validate(&self) -> Result<(), CategoryConfigError> {
        if self.criteria.is_empty() {
            return Err(CategoryConfigError::NoCriteria {
                category_id: self.category_id.clone(),
            });
        }
        if !(0.0..=1.0).contains(&self.hybrid_alpha) {
            return Err(CategoryConfigError::HybridAlphaOutOfRange(self.hybrid_alpha));
        }
        if !(self.veto_penalty > 0.0 && self.veto_penalty < UTILITY_CEILING) {
            return Err(CategoryConfigError::VetoPenaltyOutOfRange(self.veto_penalty));
        }

        let mut seen = HashSet::new();
        for criterion in &self.criteria {
            if !seen.insert(criterion.id.as_str()) {
                return Err(CategoryConfigError::DuplicateCriterion(criterion.id.clone()));
            }
            if !criterion.weight_subjective.is_finite() || criterion.weight_subjective < 0.0 {
                return Err(CategoryConfigError::InvalidWeight {
                    criterion_id: criterion.id.clone(),
                    weight: criterion.weight_subjective,
                });
            }
            if criterion.data_field.split('.').any(str::is_empty) {
                return Err(CategoryConfigError::InvalidDataField {
                    criterion_id: criterion.id.clone(),
                    data_field: criterion.data_field.clone(),
                });
            }
            if let Some(threshold) = criterion.veto_threshold {
                if !threshold.is_finite() {
                    return Err(CategoryConfigError::InvalidParameters {
                        criterion_id: criterion.id.clone(),
                        detail: "veto threshold must be finite".to_string(),
                    });
                }
            }
            validate_normalization(&criterion.id, &criterion.normalization)?;
        }

        Ok(())
    }
}

fn validate_normalization(
    criterion_id: &str,
    normalization: &Normalization,
) -> Result<(), CategoryConfigError> {
    let invalid = |detail: &str| CategoryConfigError::InvalidParameters {
        criterion_id: criterion_id.to_string(),
        detail: detail.to_string(),
    };

    match normalization {
        Normalization::Linear { min, max } => {
            if !min.is_finite() || !max.is_finite() {
                return Err(invalid("linear bounds must be finite"));
            }
            if max <= min {
                return Err(invalid("linear max must exceed min"));
            }
        }
        Normalization::Sigmoid { k, x0 } => {
            if !k.is_finite() || !x0.is_finite() {
                return Err(invalid("sigmoid parameters must be finite"));
            }
            if *k <= 0.0 {
                return Err(invalid("sigmoid steepness k must be positive"));
            }
        }
        Normalization::Ordinal { scores } => {
            if scores.values().any(|score| !score.is_finite()) {
                return Err(invalid("ordinal scores must be finite"));
            }
        }
        Normalization::Boolean {
            true_value,
            false_value,
        } => {
            if !true_value.is_finite() || !false_value.is_finite() {
                return Err(invalid("boolean scores must be finite"));
            }
        }
    }

    Ok(())
}

/// Rejected category definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CategoryConfigError {
    #[error("category '{category_id}' defines no criteria")]
    NoCriteria { category_id: String },
    #[error("hybrid_alpha {0} must be within [0, 1]")]
    HybridAlphaOutOfRange(f64),
    #[error("veto_penalty {0} must be within (0, 10)")]
    VetoPenaltyOutOfRange(f64),
    #[error("criterion '{0}' is defined more than once")]
    DuplicateCriterion(String),
    #[error("criterion '{criterion_id}' has invalid subjective weight {weight}")]
    InvalidWeight { criterion_id: String, weight: f64 },
    #[error("criterion '{criterion_id}' has malformed data field '{data_field}'")]
    InvalidDataField {
        criterion_id: String,
        data_field: String,
    },
    #[error("criterion '{criterion_id}': {detail}")]
    InvalidParameters { criterion_id: String, detail: String },
}
