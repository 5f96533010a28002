use std::fmt;
use std::sync::Arc;

use stride_model::{AnalyticsReport, AnalyticsWindow, CourseId, LearnerId};
use tracing::debug;

use crate::application::unit_of_work::ProgressUnitOfWork;
use crate::domain::analytics::{AnalyticsInput, build_report};
use crate::error::{ProgressError, Result};
use crate::settings::AnalyticsSettings;

/// Read path: loads history through the ports and hands it to the pure
/// analytics functions.
#[derive(Clone)]
pub struct AnalyticsService {
    uow: Arc<ProgressUnitOfWork>,
    settings: AnalyticsSettings,
}

impl fmt::Debug for AnalyticsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AnalyticsService {
    pub fn new(uow: Arc<ProgressUnitOfWork>, settings: AnalyticsSettings) -> Self {
        Self { uow, settings }
    }

    pub async fn analyze(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
        window: AnalyticsWindow,
    ) -> Result<AnalyticsReport> {
        let days = window.len_days();
        if days > i64::from(self.settings.max_window_days) {
            return Err(ProgressError::InvalidWindow(format!(
                "window spans {days} days, the limit is {}",
                self.settings.max_window_days
            )));
        }

        let records = self
            .uow
            .progress
            .list_for_learner(learner_id, course_id)
            .await?;
        let catalog = match course_id {
            Some(course) => self.uow.catalog.list_units(course).await?,
            None => Vec::new(),
        };

        debug!(
            learner_id = %learner_id,
            records = records.len(),
            days,
            "building analytics report"
        );

        let input = AnalyticsInput {
            learner_id,
            course_id,
            window,
            records: &records,
            catalog: &catalog,
        };
        Ok(build_report(&input, &self.settings))
    }
}
