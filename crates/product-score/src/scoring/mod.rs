//! Multi-criteria decision engine.
//!
//! Raw product facts are normalized per criterion, weighted by a blend of
//! CRITIC and configured weights, combined multiplicatively, and finally
//! adjusted for any selected usage contexts.

pub mod aggregator;
pub mod context;
pub mod criteria;
mod engine;
pub mod facts;
pub mod normalizer;
mod registry;
mod result;
pub mod router;
mod service;
pub mod weights;

#[cfg(test)]
mod tests;

pub use context::{
    apply_contexts, Context, ContextConfigError, DeltaRule, FatalCondition, FatalRule,
    MutualExclusionError, ScoringSettings,
};
pub use criteria::{
    CategoryConfig, CategoryConfigError, CriterionConfig, Direction, MissingStrategy,
    Normalization,
};
pub use engine::{ProductRecord, RankedProduct, ScoreRequest, ScoringEngine};
pub use facts::{FactValue, FieldLookup, ProductFacts};
pub use normalizer::{normalize, NormalizeResult};
pub use registry::{CategoryProfile, CategoryRegistry, RegistryError};
pub use result::{
    AggregateScore, BreakdownEntry, ContextScore, Highlight, Penalty, UnifiedScoringResult,
};
pub use router::scoring_router;
pub use service::{ScoringService, ScoringServiceError};
pub use weights::{ResolvedWeights, WeightSource};
