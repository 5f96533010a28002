mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stride_core::application::{ProgressService, ProgressUnitOfWorkBuilder};
use stride_core::database::infrastructure::memory::{
    InMemoryEnrollmentStore, InMemoryProgressRepository, InMemoryUnitCatalog,
};
use stride_core::database::{ProgressRepository, WriteOutcome};
use stride_core::settings::{AnalyticsSettings, EngineSettings};
use stride_core::{ProgressError, Result};
use stride_model::{CatalogUnit, CourseId, LearnerId, ProgressKey, ProgressRecord};
use support::{Harness, sample};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_writers_keep_the_highest_position() {
    let engine = EngineSettings {
        max_write_attempts: 200,
        ..EngineSettings::default()
    };
    let h = Harness::with_settings(&[("u1", true)], engine);

    let mut tasks = Vec::new();
    for i in 0..20 {
        let service = h.service.clone();
        let course = h.course.clone();
        let learner = h.learner.clone();
        tasks.push(tokio::spawn(async move {
            service
                .record_progress(&course, &"u1".into(), &learner, &sample(f64::from(i) * 15.0, i64::from(i)))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = h
        .progress
        .get(&ProgressKey::new(h.learner.clone(), "u1".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.watch_time_seconds, 285.0);
    assert_eq!(stored.last_seen_at, support::base_time() + chrono::Duration::seconds(19));
}

/// Repository whose conditional writes always lose
#[derive(Debug, Default)]
struct AlwaysStale {
    inner: InMemoryProgressRepository,
    attempts: AtomicU32,
}

#[async_trait]
impl ProgressRepository for AlwaysStale {
    async fn get(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>> {
        self.inner.get(key).await
    }

    async fn compare_and_swap(
        &self,
        _record: &ProgressRecord,
        _expected: Option<u64>,
    ) -> Result<WriteOutcome> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(WriteOutcome::VersionMismatch)
    }

    async fn list_for_learner(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
    ) -> Result<Vec<ProgressRecord>> {
        self.inner.list_for_learner(learner_id, course_id).await
    }

    async fn archive_course(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        archived_at: DateTime<Utc>,
    ) -> Result<u64> {
        self.inner.archive_course(learner_id, course_id, archived_at).await
    }
}

#[tokio::test]
async fn exhausted_retries_surface_as_conflict() {
    let repo = Arc::new(AlwaysStale::default());
    let enrollments = InMemoryEnrollmentStore::new();
    let catalog = InMemoryUnitCatalog::new();
    let learner = LearnerId::from("learner-1");
    let course = CourseId::from("rust-101");
    catalog.upsert_unit(CatalogUnit {
        course_id: course.clone(),
        unit_id: "u1".into(),
        title: None,
        position: 0,
        total_duration_seconds: 500.0,
        minimum_watch_percentage: None,
        is_mandatory: true,
    });
    enrollments.enroll(learner.clone(), course.clone());

    let uow = ProgressUnitOfWorkBuilder::new()
        .with_progress(repo.clone())
        .with_enrollments(Arc::new(enrollments))
        .with_catalog(Arc::new(catalog))
        .build()
        .unwrap();
    let engine = EngineSettings {
        max_write_attempts: 3,
        ..EngineSettings::default()
    };
    let service = ProgressService::new(uow, engine, AnalyticsSettings::default());

    let err = service
        .record_progress(&course, &"u1".into(), &learner, &sample(100.0, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, ProgressError::Conflict { attempts: 3, .. }));
    assert_eq!(repo.attempts.load(Ordering::SeqCst), 3);
}
