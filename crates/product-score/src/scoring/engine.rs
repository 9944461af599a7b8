use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::aggregator::aggregate;
use super::context::{apply_contexts, MutualExclusionError, ScoringSettings};
use super::facts::ProductFacts;
use super::registry::CategoryProfile;
use super::result::UnifiedScoringResult;
use super::weights::{resolve_weights, sample_matrix, ResolvedWeights};

/// Optional inputs of a scoring call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub context_ids: Vec<String>,
    /// Products used to derive CRITIC weights. Empty means subjective weights only.
    #[serde(default)]
    pub comparison_sample: Vec<ProductFacts>,
    #[serde(default)]
    pub settings: ScoringSettings,
}

/// A product as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub facts: ProductFacts,
}

/// Position of one product in a category ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub rank: usize,
    pub product_id: String,
    pub result: UnifiedScoringResult,
}

/// Stateless evaluator for one category profile.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    profile: Arc<CategoryProfile>,
}

impl ScoringEngine {
    pub fn new(profile: Arc<CategoryProfile>) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &CategoryProfile {
        &self.profile
    }

    pub fn resolve_weights(&self, sample: &[ProductFacts]) -> ResolvedWeights {
        let matrix = sample_matrix(&self.profile.category, sample);
        resolve_weights(&self.profile.category, &matrix)
    }

    /// Score one product: normalize, weight, aggregate, then apply contexts.
    pub fn score(
        &self,
        facts: &ProductFacts,
        request: &ScoreRequest,
    ) -> Result<UnifiedScoringResult, MutualExclusionError> {
        let weights = self.resolve_weights(&request.comparison_sample);
        self.score_with_weights(facts, &weights, &request.context_ids, &request.settings)
    }

    pub fn score_with_weights(
        &self,
        facts: &ProductFacts,
        weights: &ResolvedWeights,
        context_ids: &[String],
        settings: &ScoringSettings,
    ) -> Result<UnifiedScoringResult, MutualExclusionError> {
        let category = &self.profile.category;
        let base = aggregate(facts, category, weights);
        apply_contexts(
            base,
            context_ids,
            &self.profile.contexts,
            settings,
            category.veto_penalty,
        )
    }

    /// Rank products by final score, best first.
    ///
    /// Without an explicit comparison sample the ranked set itself is the sample.
    pub fn rank(
        &self,
        products: &[ProductRecord],
        request: &ScoreRequest,
    ) -> Result<Vec<RankedProduct>, MutualExclusionError> {
        let weights = if request.comparison_sample.is_empty() {
            let sample: Vec<ProductFacts> =
                products.iter().map(|product| product.facts.clone()).collect();
            self.resolve_weights(&sample)
        } else {
            self.resolve_weights(&request.comparison_sample)
        };

        let mut scored = Vec::with_capacity(products.len());
        for product in products {
            let result = self.score_with_weights(
                &product.facts,
                &weights,
                &request.context_ids,
                &request.settings,
            )?;
            scored.push((product.product_id.clone(), result));
        }

        scored.sort_by(|(id_a, a), (id_b, b)| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| id_a.cmp(id_b))
        });

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(index, (product_id, result))| RankedProduct {
                rank: index + 1,
                product_id,
                result,
            })
            .collect())
    }
}
