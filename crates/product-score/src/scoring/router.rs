use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::engine::{ProductRecord, RankedProduct, ScoreRequest};
use super::facts::ProductFacts;
use super::service::{ScoringService, ScoringServiceError};

/// Payload of the single-product scoring endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBody {
    pub facts: ProductFacts,
    #[serde(flatten)]
    pub request: ScoreRequest,
}

/// Payload of the ranking endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankBody {
    pub products: Vec<ProductRecord>,
    #[serde(flatten)]
    pub request: ScoreRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub category_id: String,
    pub rankings: Vec<RankedProduct>,
}

/// Router builder exposing the scoring API.
pub fn scoring_router(service: Arc<ScoringService>) -> Router {
    Router::new()
        .route("/api/v1/categories", get(categories_handler))
        .route(
            "/api/v1/categories/:category_id/contexts",
            get(contexts_handler),
        )
        .route("/api/v1/categories/:category_id/score", post(score_handler))
        .route("/api/v1/categories/:category_id/rank", post(rank_handler))
        .with_state(service)
}

pub(crate) async fn categories_handler(State(service): State<Arc<ScoringService>>) -> Response {
    let payload = json!({ "categories": service.registry().category_ids() });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn contexts_handler(
    State(service): State<Arc<ScoringService>>,
    Path(category_id): Path<String>,
) -> Response {
    match service.contexts(&category_id) {
        Ok(contexts) => (StatusCode::OK, Json(contexts)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler(
    State(service): State<Arc<ScoringService>>,
    Path(category_id): Path<String>,
    Json(body): Json<ScoreBody>,
) -> Response {
    match service.score(&category_id, &body.facts, &body.request) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rank_handler(
    State(service): State<Arc<ScoringService>>,
    Path(category_id): Path<String>,
    Json(body): Json<RankBody>,
) -> Response {
    match service.rank(&category_id, &body.products, &body.request) {
        Ok(rankings) => {
            let payload = RankResponse {
                category_id,
                rankings,
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ScoringServiceError) -> Response {
    match error {
        ScoringServiceError::UnknownCategory(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        ScoringServiceError::Conflict(ref conflict) => {
            let payload = json!({
                "error": error.to_string(),
                "conflicting_contexts": conflict.conflicting_contexts,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
    }
}
