use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use stride_core::ProgressError;
use stride_model::{AnalyticsReport, AnalyticsWindow, ApiResponse, CourseId, LearnerId};

use crate::errors::AppResult;
use crate::infra::app_state::AppState;

/// Days covered when the caller names no window
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Falls back to the `x-learner-id` caller
    pub learner_id: Option<LearnerId>,
    pub course_id: Option<CourseId>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl AnalyticsQuery {
    /// Missing bounds default to a trailing window ending `today`
    pub fn window(&self, today: NaiveDate) -> Result<AnalyticsWindow, ProgressError> {
        let end = self.end.unwrap_or(today);
        match self.start {
            Some(start) => Ok(AnalyticsWindow::new(start, end)?),
            None => Ok(AnalyticsWindow::trailing(end, DEFAULT_WINDOW_DAYS)),
        }
    }
}

/// Engagement and streak report for a learner, optionally scoped to a course
pub async fn analytics_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<LearnerId>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<AnalyticsReport>>> {
    let Query(query) = query?;
    let window = query.window(Utc::now().date_naive())?;
    let learner_id = query.learner_id.clone().unwrap_or(caller);

    let report = state
        .service()
        .analyze(&learner_id, query.course_id.as_ref(), window)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}
