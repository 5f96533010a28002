use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use stride_model::{CourseId, Enrollment, EnrollmentId, EnrollmentStatus, LearnerId};
use tracing::{debug, info, warn};

use crate::application::unit_of_work::ProgressUnitOfWork;
use crate::domain::enrollment::{aggregate, fold_snapshot};
use crate::error::{ProgressError, Result};

/// Conditional enrollment writes before giving up
const SWAP_ATTEMPTS: u32 = 5;

/// Rebuilds the cached enrollment fields from progress records.
#[derive(Clone)]
pub struct EnrollmentAggregator {
    uow: Arc<ProgressUnitOfWork>,
}

impl fmt::Debug for EnrollmentAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrollmentAggregator")
            .field("uow", &self.uow)
            .finish()
    }
}

impl EnrollmentAggregator {
    pub fn new(uow: Arc<ProgressUnitOfWork>) -> Self {
        Self { uow }
    }

    /// Recompute one enrollment. Idempotent: with no intervening progress
    /// change the stored enrollment is left untouched.
    ///
    /// The enrollment is swapped conditionally against the row it was
    /// computed from; a lost swap reloads and recomputes. The certificate
    /// callback runs only after the swap that moved the enrollment into
    /// `completed`; its failure is logged and never returned.
    pub async fn recompute(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Enrollment> {
        for attempt in 1..=SWAP_ATTEMPTS {
            let enrollment = self.load(learner_id, course_id).await?;
            let mandatory = self.uow.catalog.list_mandatory_units(course_id).await?;
            let records = self
                .uow
                .progress
                .list_for_learner(learner_id, Some(course_id))
                .await?;

            let snapshot = aggregate(&mandatory, &records);
            let outcome = fold_snapshot(&enrollment, snapshot, Utc::now());
            if outcome.enrollment == enrollment {
                return Ok(enrollment);
            }

            if !self
                .uow
                .enrollments
                .compare_and_swap(&enrollment, &outcome.enrollment)
                .await?
            {
                debug!(
                    learner_id = %learner_id,
                    course_id = %course_id,
                    attempt,
                    "enrollment changed during recompute; retrying"
                );
                tokio::task::yield_now().await;
                continue;
            }

            debug!(
                learner_id = %learner_id,
                course_id = %course_id,
                overall_percentage = outcome.enrollment.overall_percentage,
                "enrollment recomputed"
            );
            if outcome.newly_completed {
                self.notify_completed(&outcome.enrollment).await;
            }
            return Ok(outcome.enrollment);
        }

        Err(self.swap_exhausted(learner_id, course_id))
    }

    /// Moves an active enrollment to `withdrawn` so it stops accepting
    /// progress. Completed and already withdrawn enrollments are returned
    /// unchanged.
    pub async fn withdraw(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Enrollment> {
        for _ in 0..SWAP_ATTEMPTS {
            let enrollment = self.load(learner_id, course_id).await?;
            if !enrollment.is_active() {
                return Ok(enrollment);
            }

            let mut withdrawn = enrollment.clone();
            withdrawn.status = EnrollmentStatus::Withdrawn;
            if self
                .uow
                .enrollments
                .compare_and_swap(&enrollment, &withdrawn)
                .await?
            {
                info!(
                    learner_id = %learner_id,
                    course_id = %course_id,
                    "enrollment withdrawn"
                );
                return Ok(withdrawn);
            }
            tokio::task::yield_now().await;
        }

        Err(self.swap_exhausted(learner_id, course_id))
    }

    async fn load(&self, learner_id: &LearnerId, course_id: &CourseId) -> Result<Enrollment> {
        self.uow
            .enrollments
            .get_enrollment(learner_id, course_id)
            .await?
            .ok_or_else(|| {
                ProgressError::EnrollmentNotFound(format!(
                    "learner {learner_id} in course {course_id}"
                ))
            })
    }

    async fn notify_completed(&self, enrollment: &Enrollment) {
        let learner_id = &enrollment.learner_id;
        let course_id = &enrollment.course_id;
        let completion_date = enrollment.completion_date.unwrap_or_else(Utc::now);
        info!(
            learner_id = %learner_id,
            course_id = %course_id,
            "course completed"
        );
        if let Err(err) = self
            .uow
            .certificates
            .on_course_completed(learner_id, course_id, completion_date)
            .await
        {
            warn!(
                learner_id = %learner_id,
                course_id = %course_id,
                error = %err,
                "certificate issuance failed"
            );
        }
    }

    fn swap_exhausted(&self, learner_id: &LearnerId, course_id: &CourseId) -> ProgressError {
        warn!(
            learner_id = %learner_id,
            course_id = %course_id,
            attempts = SWAP_ATTEMPTS,
            "enrollment swap retries exhausted"
        );
        ProgressError::Internal(format!(
            "enrollment for learner {learner_id} in course {course_id} kept changing"
        ))
    }

    pub async fn recompute_by_id(&self, id: &EnrollmentId) -> Result<Enrollment> {
        let enrollment = self
            .uow
            .enrollments
            .get_by_id(id)
            .await?
            .ok_or_else(|| ProgressError::EnrollmentNotFound(id.to_string()))?;
        self.recompute(&enrollment.learner_id, &enrollment.course_id)
            .await
    }
}
