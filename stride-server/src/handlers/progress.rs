use axum::{
    Extension, Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use stride_model::{
    ApiResponse, BatchOutcome, BatchProgressRequest, CourseId, LearnerId,
    ProgressRecord, RecordProgressRequest,
};
use tracing::debug;

use crate::errors::AppResult;
use crate::infra::app_state::AppState;

const DEFAULT_CONTINUE_LIMIT: usize = 20;
const MAX_CONTINUE_LIMIT: usize = 100;

/// Record one playback sample for the calling learner
///
/// # Request
///
/// ```json
/// {
///   "course_id": "rust-101",
///   "unit_id": "ownership",
///   "sample": {
///     "current_position_seconds": 450.0,
///     "total_duration_seconds": 500.0,
///     "observed_at": "2024-05-06T09:00:00Z"
///   }
/// }
/// ```
///
/// # Response
///
/// - `200 OK` with the merged progress record
/// - `400 Bad Request` for a malformed sample
/// - `403 Forbidden` when the learner is not actively enrolled
/// - `404 Not Found` when the unit is not in the course catalog
/// - `409 Conflict` when concurrent writers exhausted the retry budget
pub async fn record_progress_handler(
    State(state): State<AppState>,
    Extension(learner_id): Extension<LearnerId>,
    payload: Result<Json<RecordProgressRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<ProgressRecord>>> {
    let Json(request) = payload?;

    let record = state
        .service()
        .record_progress(&request.course_id, &request.unit_id, &learner_id, &request.sample)
        .await?;

    Ok(Json(ApiResponse::success(record)))
}

/// Flush a buffer of offline samples
///
/// Items are applied independently: a failing item is reported in the
/// per-item results and the rest still persist. The whole request only
/// fails when the learner is not enrolled or the batch is too large.
pub async fn record_batch_handler(
    State(state): State<AppState>,
    Extension(learner_id): Extension<LearnerId>,
    payload: Result<Json<BatchProgressRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<BatchOutcome>>> {
    let Json(request) = payload?;
    debug!(
        learner_id = %learner_id,
        course_id = %request.course_id,
        items = request.items.len(),
        "batch received"
    );

    let outcome = state
        .service()
        .record_batch(&request.course_id, &learner_id, request.items)
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct ContinueWatchingQuery {
    pub course_id: Option<CourseId>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_CONTINUE_LIMIT
}

/// In-progress units for the caller, most recently watched first
pub async fn continue_watching_handler(
    State(state): State<AppState>,
    Extension(learner_id): Extension<LearnerId>,
    query: Result<Query<ContinueWatchingQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<ProgressRecord>>>> {
    let Query(query) = query?;
    let limit = query.limit.min(MAX_CONTINUE_LIMIT);

    let records = state
        .service()
        .continue_watching(&learner_id, query.course_id.as_ref(), limit)
        .await?;

    Ok(Json(ApiResponse::success(records)))
}
