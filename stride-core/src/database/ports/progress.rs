use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stride_model::{CourseId, LearnerId, ProgressKey, ProgressRecord};

use crate::error::Result;

/// Outcome of a conditional write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The record as stored, carrying its new version
    Written(ProgressRecord),
    /// Another writer got there first; reload and retry
    VersionMismatch,
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn get(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>>;

    /// Persist `record` only if the stored version still equals `expected`.
    ///
    /// `expected == None` means the caller saw no record and the write is an
    /// insert; it fails with [`WriteOutcome::VersionMismatch`] if a row
    /// appeared in the meantime. The stored version is bumped by one.
    async fn compare_and_swap(
        &self,
        record: &ProgressRecord,
        expected: Option<u64>,
    ) -> Result<WriteOutcome>;

    /// All records of a learner, optionally narrowed to one course.
    /// Archived records are included; callers decide whether they count.
    async fn list_for_learner(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
    ) -> Result<Vec<ProgressRecord>>;

    /// Stamps `archived_at` on every live record of the pair and returns how
    /// many were archived
    async fn archive_course(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        archived_at: DateTime<Utc>,
    ) -> Result<u64>;
}
