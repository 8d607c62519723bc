//! Axum route handlers for the Evaluation API.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::classification::{level, points, FactorId, GradeBandTable};
use crate::errors::AppError;
use crate::evaluations::models::{
    EvaluationRequest, EvaluationResponse, GradesQuery, GradesResponse, LevelQuery,
    LevelResponse, PdDraftRequest, PdDraftResponse,
};
use crate::evaluations::pipeline;
use crate::state::AppState;

/// GET /api/v1/grades?ratingSystem=FES|GSSG
///
/// The reachable grade bands for one rating system (FES when omitted).
pub async fn handle_grades(Query(query): Query<GradesQuery>) -> Json<GradesResponse> {
    let rating_system = query.rating_system.unwrap_or_default();
    Json(GradesResponse {
        rating_system,
        bands: GradeBandTable::for_system(rating_system).bands().to_vec(),
    })
}

/// GET /api/v1/levels?ratingSystem=FES&factor=7&level=7-B
///
/// Points and neighbouring levels for one factor level, for level pickers.
/// An unreadable level scores 0 with no neighbours rather than failing.
pub async fn handle_level(Query(query): Query<LevelQuery>) -> Result<Json<LevelResponse>, AppError> {
    let rating_system = query.rating_system.unwrap_or_default();
    let factor = query
        .factor
        .parse::<FactorId>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if !rating_system.has_factor(factor) {
        return Err(AppError::Validation(format!(
            "factor {factor} is not part of {rating_system}"
        )));
    }

    let id = factor.as_str();
    Ok(Json(LevelResponse {
        rating_system,
        factor,
        points: points::lookup(rating_system, id, &query.level),
        next_higher: level::next_higher(rating_system, id, &query.level),
        next_lower: level::next_lower(rating_system, id, &query.level),
        level: query.level,
    }))
}

/// POST /api/v1/evaluations/generate
///
/// The model proposes every factor; the result is normalized and reconciled
/// into the target band.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>, AppError> {
    Ok(Json(pipeline::generate(&state, &request).await?))
}

/// POST /api/v1/evaluations/regenerate
pub async fn handle_regenerate(
    State(state): State<AppState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>, AppError> {
    Ok(Json(pipeline::regenerate(&state, &request).await?))
}

/// POST /api/v1/evaluations/update
///
/// Re-scores user-edited levels. Never calls the model.
pub async fn handle_update(
    State(state): State<AppState>,
    Json(request): Json<EvaluationRequest>,
) -> Result<Json<EvaluationResponse>, AppError> {
    Ok(Json(pipeline::update(&state, &request)?))
}

/// POST /api/v1/pd/draft
pub async fn handle_pd_draft(
    State(state): State<AppState>,
    Json(request): Json<PdDraftRequest>,
) -> Result<Json<PdDraftResponse>, AppError> {
    Ok(Json(pipeline::draft(&state, &request).await?))
}
