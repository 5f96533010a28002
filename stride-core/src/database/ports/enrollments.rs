use async_trait::async_trait;
use stride_model::{CourseId, Enrollment, EnrollmentId, LearnerId};

use crate::error::Result;

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// The enrollment for the pair, whatever its status
    async fn get_enrollment(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>>;

    async fn get_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>>;

    /// Replaces the status and derived fields of an existing enrollment with
    /// those of `next`, but only while the stored row still equals
    /// `expected`. Returns `false` when another writer changed it first or
    /// the row is gone.
    async fn compare_and_swap(&self, expected: &Enrollment, next: &Enrollment) -> Result<bool>;

    /// The enrollment only if it still accepts progress
    async fn get_active_enrollment(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>> {
        Ok(self
            .get_enrollment(learner_id, course_id)
            .await?
            .filter(Enrollment::is_active))
    }
}
