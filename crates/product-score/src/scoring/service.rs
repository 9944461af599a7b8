use super::context::{Context, MutualExclusionError};
use super::engine::{ProductRecord, RankedProduct, ScoreRequest, ScoringEngine};
use super::facts::ProductFacts;
use super::registry::CategoryRegistry;
use super::result::UnifiedScoringResult;

/// Entry point composing the category registry with per-category engines.
#[derive(Debug, Clone)]
pub struct ScoringService {
    registry: CategoryRegistry,
}

impl ScoringService {
    pub fn new(registry: CategoryRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn engine(&self, category_id: &str) -> Result<ScoringEngine, ScoringServiceError> {
        self.registry
            .get(category_id)
            .map(ScoringEngine::new)
            .ok_or_else(|| ScoringServiceError::UnknownCategory(category_id.to_string()))
    }

    /// Score a single product within a category.
    pub fn score(
        &self,
        category_id: &str,
        facts: &ProductFacts,
        request: &ScoreRequest,
    ) -> Result<UnifiedScoringResult, ScoringServiceError> {
        let engine = self.engine(category_id)?;
        let result = engine.score(facts, request)?;
        tracing::debug!(
            category = category_id,
            final_score = result.final_score,
            is_fatal = result.is_fatal,
            "product scored"
        );
        Ok(result)
    }

    /// Rank a product set within a category.
    pub fn rank(
        &self,
        category_id: &str,
        products: &[ProductRecord],
        request: &ScoreRequest,
    ) -> Result<Vec<RankedProduct>, ScoringServiceError> {
        let engine = self.engine(category_id)?;
        Ok(engine.rank(products, request)?)
    }

    pub fn contexts(&self, category_id: &str) -> Result<Vec<Context>, ScoringServiceError> {
        self.registry
            .get(category_id)
            .map(|profile| profile.contexts.clone())
            .ok_or_else(|| ScoringServiceError::UnknownCategory(category_id.to_string()))
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error(transparent)]
    Conflict(#[from] MutualExclusionError),
}
