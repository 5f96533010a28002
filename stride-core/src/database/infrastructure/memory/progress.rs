use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use stride_model::{CourseId, LearnerId, ProgressKey, ProgressRecord};

use crate::database::ports::progress::{ProgressRepository, WriteOutcome};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct InMemoryProgressRepository {
    records: Arc<DashMap<ProgressKey, ProgressRecord>>,
}

impl InMemoryProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn get(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn compare_and_swap(
        &self,
        record: &ProgressRecord,
        expected: Option<u64>,
    ) -> Result<WriteOutcome> {
        // The entry guard holds the shard lock for the whole check-and-set.
        match self.records.entry(record.key()) {
            Entry::Vacant(slot) => {
                if expected.is_some() {
                    return Ok(WriteOutcome::VersionMismatch);
                }
                let mut stored = record.clone();
                stored.version = 1;
                slot.insert(stored.clone());
                Ok(WriteOutcome::Written(stored))
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get().version;
                if expected != Some(current) {
                    return Ok(WriteOutcome::VersionMismatch);
                }
                let mut stored = record.clone();
                stored.version = current + 1;
                slot.insert(stored.clone());
                Ok(WriteOutcome::Written(stored))
            }
        }
    }

    async fn list_for_learner(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
    ) -> Result<Vec<ProgressRecord>> {
        let mut records: Vec<ProgressRecord> = self
            .records
            .iter()
            .filter(|entry| &entry.learner_id == learner_id)
            .filter(|entry| course_id.is_none_or(|course| &entry.course_id == course))
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        Ok(records)
    }

    async fn archive_course(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        archived_at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut archived = 0;
        for mut entry in self.records.iter_mut() {
            let record = entry.value_mut();
            if &record.learner_id == learner_id
                && &record.course_id == course_id
                && record.archived_at.is_none()
            {
                record.archived_at = Some(archived_at);
                record.version += 1;
                archived += 1;
            }
        }
        Ok(archived)
    }
}
