mod support;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stride_core::ProgressError;
use stride_core::database::infrastructure::memory::InMemoryProgressRepository;
use stride_core::database::{EnrollmentStore, ProgressRepository, WriteOutcome};
use stride_core::settings::EngineSettings;
use stride_model::{BatchItem, CourseId, LearnerId, ProgressKey, ProgressRecord};
use support::{Harness, sample};

/// Progress store whose reads suspend before answering, so concurrent
/// writers interleave between read and write.
struct YieldingReads(InMemoryProgressRepository);

#[async_trait]
impl ProgressRepository for YieldingReads {
    async fn get(&self, key: &ProgressKey) -> stride_core::Result<Option<ProgressRecord>> {
        tokio::task::yield_now().await;
        self.0.get(key).await
    }

    async fn compare_and_swap(
        &self,
        record: &ProgressRecord,
        expected: Option<u64>,
    ) -> stride_core::Result<WriteOutcome> {
        self.0.compare_and_swap(record, expected).await
    }

    async fn list_for_learner(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
    ) -> stride_core::Result<Vec<ProgressRecord>> {
        self.0.list_for_learner(learner_id, course_id).await
    }

    async fn archive_course(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        archived_at: DateTime<Utc>,
    ) -> stride_core::Result<u64> {
        self.0.archive_course(learner_id, course_id, archived_at).await
    }
}

fn item(unit: &str, position: f64, offset: i64) -> BatchItem {
    BatchItem {
        unit_id: unit.into(),
        sample: sample(position, offset),
    }
}

async fn snapshot(h: &Harness) -> Vec<ProgressRecord> {
    h.progress.list_for_learner(&h.learner, None).await.unwrap()
}

#[tokio::test]
async fn failed_item_does_not_abort_the_batch() {
    let h = Harness::new(&[("u1", true), ("u2", true)]);

    let outcome = h
        .service
        .record_batch(
            &h.course,
            &h.learner,
            vec![item("u1", 120.0, 0), item("ghost", 30.0, 5), item("u2", 450.0, 10)],
        )
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 2);
    assert_eq!(outcome.failed, 1);
    assert!(outcome.results[0].ok);
    assert!(!outcome.results[1].ok);
    assert!(outcome.results[1].error.is_some());
    assert!(outcome.results[2].ok);

    for unit in ["u1", "u2"] {
        let key = ProgressKey::new(h.learner.clone(), unit.into());
        assert!(h.progress.get(&key).await.unwrap().is_some());
    }
    assert_eq!(outcome.enrollment.map(|e| e.overall_percentage), Some(50));
}

#[tokio::test]
async fn replaying_a_batch_in_any_order_converges() {
    let h = Harness::new(&[("u1", true), ("u2", true), ("u3", true)]);
    let items = vec![
        item("u1", 100.0, 0),
        item("u1", 300.0, 60),
        item("u1", 200.0, 30),
        item("u2", 480.0, 90),
        item("u3", 20.0, 120),
    ];

    let first = h
        .service
        .record_batch(&h.course, &h.learner, items.clone())
        .await
        .unwrap();
    let after_first = snapshot(&h).await;
    let enrollment_first = h.enrollments.get_enrollment(&h.learner, &h.course).await.unwrap();

    let mut reversed = items.clone();
    reversed.reverse();
    let second = h
        .service
        .record_batch(&h.course, &h.learner, reversed)
        .await
        .unwrap();

    assert_eq!(first.succeeded, 5);
    assert_eq!(second.succeeded, 5);
    assert_eq!(snapshot(&h).await, after_first);
    assert_eq!(
        h.enrollments.get_enrollment(&h.learner, &h.course).await.unwrap(),
        enrollment_first
    );

    let u1 = after_first.iter().find(|r| r.unit_id.as_str() == "u1").unwrap();
    assert_eq!(u1.watch_time_seconds, 300.0);
    assert_eq!(u1.resume_position_seconds, 300.0);
}

#[tokio::test]
async fn oversized_batch_is_rejected_up_front() {
    let engine = EngineSettings {
        max_batch_items: 2,
        ..EngineSettings::default()
    };
    let h = Harness::with_settings(&[("u1", true)], engine);

    let err = h
        .service
        .record_batch(
            &h.course,
            &h.learner,
            vec![item("u1", 1.0, 0), item("u1", 2.0, 1), item("u1", 3.0, 2)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::InvalidSample(_)));
    assert!(h.progress.is_empty());
}

#[tokio::test]
async fn batch_from_unenrolled_learner_fails_wholesale() {
    let h = Harness::new(&[("u1", true)]);
    let err = h
        .service
        .record_batch(&h.course, &LearnerId::from("stranger"), vec![item("u1", 1.0, 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::NotEnrolled { .. }));
}

#[tokio::test]
async fn many_samples_for_one_unit_never_conflict() {
    let h = Harness::with_progress_adapter(
        &[("u1", true), ("u2", true)],
        EngineSettings::default(),
        |progress| Arc::new(YieldingReads(progress)),
    );
    let mut items: Vec<BatchItem> =
        (0..40).map(|i| item("u1", f64::from(i) * 10.0, i64::from(i) * 15)).collect();
    items.insert(20, item("u2", 60.0, 5));

    let outcome = h
        .service
        .record_batch(&h.course, &h.learner, items)
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, 41);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.results[20].unit_id.as_str(), "u2");

    let key = ProgressKey::new(h.learner.clone(), "u1".into());
    let u1 = h.progress.get(&key).await.unwrap().unwrap();
    assert_eq!(u1.watch_time_seconds, 390.0);
    assert_eq!(u1.engagement_signals.total_samples(), 40);
}
