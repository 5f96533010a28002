use std::sync::Arc;

use chrono::Utc;
use stride_model::{
    AnalyticsReport, AnalyticsWindow, BatchItem, BatchOutcome, CourseId, Enrollment,
    EnrollmentId, EnrollmentProgress, LearnerId, ProgressRecord, UnitId,
    UnitProgressSummary, WatchSample,
};
use tracing::info;

use crate::application::aggregator::EnrollmentAggregator;
use crate::application::analytics::AnalyticsService;
use crate::application::ingest::EventIngestor;
use crate::application::unit_of_work::ProgressUnitOfWork;
use crate::error::{ProgressError, Result};
use crate::settings::{AnalyticsSettings, EngineSettings};

/// Facade over the ingestor, aggregator and analytics service sharing one
/// unit of work.
#[derive(Debug, Clone)]
pub struct ProgressService {
    uow: Arc<ProgressUnitOfWork>,
    ingestor: EventIngestor,
    aggregator: EnrollmentAggregator,
    analytics: AnalyticsService,
}

impl ProgressService {
    pub fn new(
        uow: ProgressUnitOfWork,
        engine: EngineSettings,
        analytics: AnalyticsSettings,
    ) -> Self {
        let uow = Arc::new(uow);
        let aggregator = EnrollmentAggregator::new(uow.clone());
        Self {
            ingestor: EventIngestor::new(uow.clone(), aggregator.clone(), engine),
            analytics: AnalyticsService::new(uow.clone(), analytics),
            aggregator,
            uow,
        }
    }

    pub fn unit_of_work(&self) -> &ProgressUnitOfWork {
        &self.uow
    }

    pub async fn record_progress(
        &self,
        course_id: &CourseId,
        unit_id: &UnitId,
        learner_id: &LearnerId,
        sample: &WatchSample,
    ) -> Result<ProgressRecord> {
        self.ingestor
            .record_progress(course_id, unit_id, learner_id, sample)
            .await
    }

    pub async fn record_batch(
        &self,
        course_id: &CourseId,
        learner_id: &LearnerId,
        items: Vec<BatchItem>,
    ) -> Result<BatchOutcome> {
        self.ingestor.record_batch(course_id, learner_id, items).await
    }

    pub async fn recompute(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Enrollment> {
        self.aggregator.recompute(learner_id, course_id).await
    }

    pub async fn recompute_enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        self.aggregator.recompute_by_id(id).await
    }

    pub async fn analyze(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
        window: AnalyticsWindow,
    ) -> Result<AnalyticsReport> {
        self.analytics.analyze(learner_id, course_id, window).await
    }

    /// In-progress units ordered by most recently watched
    pub async fn continue_watching(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
        limit: usize,
    ) -> Result<Vec<ProgressRecord>> {
        let mut records: Vec<ProgressRecord> = self
            .uow
            .progress
            .list_for_learner(learner_id, course_id)
            .await?
            .into_iter()
            .filter(|record| !record.is_archived() && record.status.is_open())
            .filter(|record| record.watch_time_seconds > 0.0)
            .collect();
        records.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
        records.truncate(limit);
        Ok(records)
    }

    pub async fn enrollment(&self, id: &EnrollmentId) -> Result<Enrollment> {
        self.uow
            .enrollments
            .get_by_id(id)
            .await?
            .ok_or_else(|| ProgressError::EnrollmentNotFound(id.to_string()))
    }

    /// Current enrollment plus a summary of every live unit record
    pub async fn enrollment_progress(&self, id: &EnrollmentId) -> Result<EnrollmentProgress> {
        let enrollment = self.enrollment(id).await?;
        let units = self
            .uow
            .progress
            .list_for_learner(&enrollment.learner_id, Some(&enrollment.course_id))
            .await?
            .iter()
            .filter(|record| !record.is_archived())
            .map(UnitProgressSummary::from)
            .collect();
        Ok(EnrollmentProgress { enrollment, units })
    }

    /// Withdraws the enrollment and soft-archives the pair's progress.
    /// Records are kept but drop out of aggregation, analytics and
    /// continue-watching. A withdrawn enrollment rejects further samples
    /// with `NotEnrolled`, so archived records are never written again.
    pub async fn archive_enrollment_progress(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<u64> {
        self.aggregator.withdraw(learner_id, course_id).await?;
        let archived = self
            .uow
            .progress
            .archive_course(learner_id, course_id, Utc::now())
            .await?;
        info!(
            learner_id = %learner_id,
            course_id = %course_id,
            archived,
            "archived enrollment progress"
        );
        Ok(archived)
    }

    pub async fn archive_enrollment(&self, id: &EnrollmentId) -> Result<u64> {
        let enrollment = self.enrollment(id).await?;
        self.archive_enrollment_progress(&enrollment.learner_id, &enrollment.course_id)
            .await
    }
}
