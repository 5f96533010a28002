use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use stride_model::{CourseId, Enrollment, EnrollmentId, LearnerId};

use crate::database::ports::enrollments::EnrollmentStore;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct InMemoryEnrollmentStore {
    enrollments: Arc<DashMap<(LearnerId, CourseId), Enrollment>>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrolls a learner, returning the stored enrollment. Re-enrolling
    /// keeps the existing row.
    pub fn enroll(&self, learner_id: LearnerId, course_id: CourseId) -> Enrollment {
        self.enrollments
            .entry((learner_id.clone(), course_id.clone()))
            .or_insert_with(|| Enrollment::new(learner_id, course_id))
            .clone()
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn get_enrollment(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>> {
        Ok(self
            .enrollments
            .get(&(learner_id.clone(), course_id.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn get_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>> {
        Ok(self
            .enrollments
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| entry.value().clone()))
    }

    async fn compare_and_swap(&self, expected: &Enrollment, next: &Enrollment) -> Result<bool> {
        // get_mut holds the shard lock across the comparison and the write.
        let key = (expected.learner_id.clone(), expected.course_id.clone());
        let Some(mut stored) = self.enrollments.get_mut(&key) else {
            return Ok(false);
        };
        if *stored != *expected {
            return Ok(false);
        }
        *stored = next.clone();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_model::EnrollmentStatus;

    #[tokio::test]
    async fn stale_snapshot_cannot_overwrite_completion() {
        let store = InMemoryEnrollmentStore::new();
        let stale = store.enroll("learner-1".into(), "course-1".into());

        let mut completed = stale.clone();
        completed.overall_percentage = 100;
        completed.status = EnrollmentStatus::Completed;
        assert!(store.compare_and_swap(&stale, &completed).await.unwrap());

        let mut downgrade = stale.clone();
        downgrade.overall_percentage = 50;
        assert!(!store.compare_and_swap(&stale, &downgrade).await.unwrap());

        let stored = store
            .get_enrollment(&stale.learner_id, &stale.course_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, completed);
    }

    #[tokio::test]
    async fn missing_enrollment_is_not_written() {
        let store = InMemoryEnrollmentStore::new();
        let ghost = Enrollment::new("learner-1".into(), "course-1".into());
        assert!(!store.compare_and_swap(&ghost, &ghost).await.unwrap());
        assert!(
            store
                .get_enrollment(&ghost.learner_id, &ghost.course_id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
