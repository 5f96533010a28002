use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    handlers::{analytics, enrollments, progress},
    middleware::require_learner,
};

pub mod paths {
    pub const PROGRESS_RECORD: &str = "/progress/record";
    pub const PROGRESS_BATCH: &str = "/progress/batch";
    pub const PROGRESS_ANALYTICS: &str = "/progress/analytics";
    pub const PROGRESS_CONTINUE: &str = "/progress/continue";
    pub const ENROLLMENT_PROGRESS: &str = "/enrollments/{enrollment_id}/progress";
    pub const ENROLLMENT_RECOMPUTE: &str = "/enrollments/{enrollment_id}/recompute";
    pub const ENROLLMENT_ARCHIVE: &str = "/enrollments/{enrollment_id}/archive";
}

/// Create all v1 API routes. Every route requires a learner identity.
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .merge(create_progress_routes())
        .merge(create_enrollment_routes())
        .route_layer(middleware::from_fn(require_learner))
}

fn create_progress_routes() -> Router<AppState> {
    Router::new()
        .route(paths::PROGRESS_RECORD, post(progress::record_progress_handler))
        .route(paths::PROGRESS_BATCH, post(progress::record_batch_handler))
        .route(paths::PROGRESS_ANALYTICS, get(analytics::analytics_handler))
        .route(paths::PROGRESS_CONTINUE, get(progress::continue_watching_handler))
}

fn create_enrollment_routes() -> Router<AppState> {
    Router::new()
        .route(
            paths::ENROLLMENT_PROGRESS,
            get(enrollments::enrollment_progress_handler),
        )
        .route(
            paths::ENROLLMENT_RECOMPUTE,
            post(enrollments::recompute_enrollment_handler),
        )
        .route(
            paths::ENROLLMENT_ARCHIVE,
            post(enrollments::archive_enrollment_handler),
        )
}
