use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::{StreamExt, stream};
use stride_model::{
    BatchItem, BatchItemResult, BatchOutcome, CourseId, Enrollment, LearnerId,
    ProgressKey, ProgressRecord, UnitId, WatchSample,
};
use tracing::{debug, info, warn};

use crate::application::aggregator::EnrollmentAggregator;
use crate::application::unit_of_work::ProgressUnitOfWork;
use crate::database::ports::WriteOutcome;
use crate::domain::progress::{Applied, UnitIdentity, apply, validate_sample};
use crate::error::{ProgressError, Result};
use crate::settings::EngineSettings;

/// Entry point for watch samples, single or batched.
#[derive(Clone)]
pub struct EventIngestor {
    uow: Arc<ProgressUnitOfWork>,
    aggregator: EnrollmentAggregator,
    settings: EngineSettings,
}

impl fmt::Debug for EventIngestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventIngestor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl EventIngestor {
    pub fn new(
        uow: Arc<ProgressUnitOfWork>,
        aggregator: EnrollmentAggregator,
        settings: EngineSettings,
    ) -> Self {
        Self {
            uow,
            aggregator,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Apply one sample. When it completes the unit the enrollment is
    /// recomputed before returning; a failed recompute is logged, the
    /// progress write stands.
    pub async fn record_progress(
        &self,
        course_id: &CourseId,
        unit_id: &UnitId,
        learner_id: &LearnerId,
        sample: &WatchSample,
    ) -> Result<ProgressRecord> {
        self.require_enrollment(learner_id, course_id).await?;

        let identity =
            UnitIdentity::new(learner_id.clone(), course_id.clone(), unit_id.clone());
        let applied = self.write_unit(&identity, sample).await?;

        if applied.newly_completed() {
            info!(
                learner_id = %learner_id,
                course_id = %course_id,
                unit_id = %unit_id,
                "unit completed"
            );
            self.recompute_logged(learner_id, course_id).await;
        }

        Ok(applied.record)
    }

    /// Apply a batch of buffered samples. Items are isolated from each
    /// other; only a missing enrollment or an oversized batch fails the call.
    /// The enrollment is recomputed once after every item has settled.
    pub async fn record_batch(
        &self,
        course_id: &CourseId,
        learner_id: &LearnerId,
        items: Vec<BatchItem>,
    ) -> Result<BatchOutcome> {
        if items.len() > self.settings.max_batch_items {
            return Err(ProgressError::InvalidSample(format!(
                "batch of {} items exceeds the limit of {}",
                items.len(),
                self.settings.max_batch_items
            )));
        }
        self.require_enrollment(learner_id, course_id).await?;

        // Samples for one unit are applied in order by a single task; distinct
        // units write concurrently.
        let mut settled: Vec<(usize, BatchItemResult)> = stream::iter(group_by_unit(items))
            .map(|(unit_id, samples)| async move {
                let identity =
                    UnitIdentity::new(learner_id.clone(), course_id.clone(), unit_id);
                let mut results = Vec::with_capacity(samples.len());
                for (index, sample) in samples {
                    let result = match self.write_unit(&identity, &sample).await {
                        Ok(_) => BatchItemResult::success(identity.unit_id.clone()),
                        Err(err) => {
                            debug!(
                                learner_id = %learner_id,
                                unit_id = %identity.unit_id,
                                error = %err,
                                "batch item rejected"
                            );
                            BatchItemResult::failure(identity.unit_id.clone(), err.to_string())
                        }
                    };
                    results.push((index, result));
                }
                results
            })
            .buffer_unordered(self.settings.batch_concurrency.max(1))
            .flat_map(stream::iter)
            .collect()
            .await;
        settled.sort_by_key(|(index, _)| *index);
        let results = settled.into_iter().map(|(_, result)| result).collect();

        let mut outcome = BatchOutcome::from_results(results);
        if outcome.succeeded > 0 {
            outcome.enrollment = self.recompute_logged(learner_id, course_id).await;
        }

        info!(
            learner_id = %learner_id,
            course_id = %course_id,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "batch ingested"
        );
        Ok(outcome)
    }

    async fn require_enrollment(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Enrollment> {
        self.uow
            .enrollments
            .get_active_enrollment(learner_id, course_id)
            .await?
            .ok_or_else(|| ProgressError::NotEnrolled {
                learner_id: learner_id.clone(),
                course_id: course_id.clone(),
            })
    }

    /// Read-modify-write of one record, retried on version conflicts.
    async fn write_unit(
        &self,
        identity: &UnitIdentity,
        sample: &WatchSample,
    ) -> Result<Applied> {
        validate_sample(sample)?;

        let unit = self
            .uow
            .catalog
            .get_unit(&identity.course_id, &identity.unit_id)
            .await?
            .ok_or_else(|| ProgressError::UnitNotFound {
                course_id: identity.course_id.clone(),
                unit_id: identity.unit_id.clone(),
            })?;
        let criteria = unit.criteria(self.settings.default_minimum_watch_percentage);
        let key = ProgressKey::new(identity.learner_id.clone(), identity.unit_id.clone());
        let attempts = self.settings.max_write_attempts.max(1);

        for attempt in 1..=attempts {
            let existing = self.uow.progress.get(&key).await?;
            let applied = apply(existing.as_ref(), identity, sample, &criteria)?;

            // Replayed samples leave the record as it is; skip the write.
            if existing.as_ref() == Some(&applied.record) {
                return Ok(applied);
            }

            let expected = existing.as_ref().map(|record| record.version);
            match self.uow.progress.compare_and_swap(&applied.record, expected).await? {
                WriteOutcome::Written(record) => {
                    return Ok(Applied {
                        record,
                        previous_status: applied.previous_status,
                    });
                }
                WriteOutcome::VersionMismatch => {
                    debug!(
                        learner_id = %identity.learner_id,
                        unit_id = %identity.unit_id,
                        attempt,
                        "progress write lost a race; retrying"
                    );
                    tokio::task::yield_now().await;
                }
            }
        }

        warn!(
            learner_id = %identity.learner_id,
            unit_id = %identity.unit_id,
            attempts,
            "progress write conflict retries exhausted"
        );
        Err(ProgressError::Conflict {
            learner_id: identity.learner_id.clone(),
            unit_id: identity.unit_id.clone(),
            attempts,
        })
    }

    async fn recompute_logged(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Option<Enrollment> {
        match self.aggregator.recompute(learner_id, course_id).await {
            Ok(enrollment) => Some(enrollment),
            Err(err) => {
                warn!(
                    learner_id = %learner_id,
                    course_id = %course_id,
                    error = %err,
                    "enrollment recompute failed after progress write"
                );
                None
            }
        }
    }
}

/// Splits a batch into per-unit runs, keeping first-seen unit order and each
/// item's position in the request.
fn group_by_unit(items: Vec<BatchItem>) -> Vec<(UnitId, Vec<(usize, WatchSample)>)> {
    let mut slots: HashMap<UnitId, usize> = HashMap::new();
    let mut groups: Vec<(UnitId, Vec<(usize, WatchSample)>)> = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let slot = *slots.entry(item.unit_id.clone()).or_insert_with(|| {
            groups.push((item.unit_id.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((index, item.sample));
    }
    groups
}
