//! HTTP surface for the engine's two operations: compute (or fetch cached)
//! a match, and invalidate a cached pair.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::scoring::MatchResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ComputeMatchRequest {
    pub resume_id: Uuid,
    pub job_id: Uuid,
}

#[derive(Deserialize)]
pub struct PairQuery {
    pub resume_id: Uuid,
    pub job_id: Uuid,
}

/// POST /api/v1/matches/compute
///
/// Always 200 with the typed result; a `success: false` body is the
/// degraded-but-non-fatal outcome, never a 5xx.
pub async fn handle_compute_match(
    State(state): State<AppState>,
    Json(req): Json<ComputeMatchRequest>,
) -> Json<MatchResult> {
    let result = state
        .orchestrator
        .compute_match(req.resume_id, req.job_id)
        .await;
    Json(result)
}

/// GET /api/v1/matches/cached?resume_id=&job_id=
pub async fn handle_get_cached(
    State(state): State<AppState>,
    Query(params): Query<PairQuery>,
) -> Result<Json<MatchResult>, AppError> {
    state
        .orchestrator
        .get_cached(params.resume_id, params.job_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No cached match for pair ({}, {})",
                params.resume_id, params.job_id
            ))
        })
}

/// DELETE /api/v1/matches/cache?resume_id=&job_id=
///
/// Used when upstream data changes (a resume re-parse, a job edit) and the
/// next compute must not serve a stale score.
pub async fn handle_invalidate(
    State(state): State<AppState>,
    Query(params): Query<PairQuery>,
) -> StatusCode {
    state
        .orchestrator
        .invalidate(params.resume_id, params.job_id)
        .await;
    StatusCode::NO_CONTENT
}
