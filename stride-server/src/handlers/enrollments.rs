use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};
use stride_model::{
    ApiResponse, ArchiveResponse, Enrollment, EnrollmentId, EnrollmentProgress, LearnerId,
};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::infra::app_state::AppState;

/// Loads the enrollment and checks it belongs to the caller
async fn owned_enrollment(
    state: &AppState,
    caller: &LearnerId,
    id: &EnrollmentId,
) -> AppResult<Enrollment> {
    let enrollment = state.service().enrollment(id).await?;
    if &enrollment.learner_id != caller {
        return Err(AppError::forbidden(format!(
            "enrollment {id} does not belong to the caller"
        )));
    }
    Ok(enrollment)
}

/// Current enrollment plus a summary per unit
pub async fn enrollment_progress_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<LearnerId>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<EnrollmentProgress>>> {
    let Path(id) = path?;
    let id = EnrollmentId(id);
    owned_enrollment(&state, &caller, &id).await?;

    let progress = state.service().enrollment_progress(&id).await?;
    Ok(Json(ApiResponse::success(progress)))
}

/// Re-derives the enrollment from its progress records
pub async fn recompute_enrollment_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<LearnerId>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Enrollment>>> {
    let Path(id) = path?;
    let id = EnrollmentId(id);
    owned_enrollment(&state, &caller, &id).await?;

    let enrollment = state.service().recompute_enrollment(&id).await?;
    Ok(Json(ApiResponse::success(enrollment)))
}

/// Soft-archives the enrollment's progress on withdrawal
pub async fn archive_enrollment_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<LearnerId>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<ArchiveResponse>>> {
    let Path(id) = path?;
    let enrollment = owned_enrollment(&state, &caller, &EnrollmentId(id)).await?;

    let archived = state
        .service()
        .archive_enrollment_progress(&enrollment.learner_id, &enrollment.course_id)
        .await?;
    Ok(Json(ApiResponse::success(ArchiveResponse { archived })))
}
