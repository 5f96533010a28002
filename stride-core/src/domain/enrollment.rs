//! Enrollment-level aggregation over mandatory unit progress.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use stride_model::{Enrollment, EnrollmentStatus, ProgressRecord, UnitId};

/// Derived enrollment fields, recomputable from progress records alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSnapshot {
    pub overall_percentage: u8,
    pub completed_unit_ids: BTreeSet<UnitId>,
    pub mandatory_units: usize,
}

/// `round(100 * completed / mandatory)`; a course with no mandatory units is 0%
pub fn overall_percentage(completed: usize, mandatory: usize) -> u8 {
    if mandatory == 0 {
        return 0;
    }
    let ratio = completed.min(mandatory) as f64 / mandatory as f64;
    (ratio * 100.0).round() as u8
}

pub fn aggregate(mandatory: &[UnitId], records: &[ProgressRecord]) -> AggregateSnapshot {
    let mandatory_set: HashSet<&UnitId> = mandatory.iter().collect();
    let completed_unit_ids: BTreeSet<UnitId> = records
        .iter()
        .filter(|record| !record.is_archived() && record.is_completed())
        .filter(|record| mandatory_set.contains(&record.unit_id))
        .map(|record| record.unit_id.clone())
        .collect();

    AggregateSnapshot {
        overall_percentage: overall_percentage(
            completed_unit_ids.len(),
            mandatory_set.len(),
        ),
        completed_unit_ids,
        mandatory_units: mandatory_set.len(),
    }
}

/// Enrollment after folding in a fresh snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOutcome {
    pub enrollment: Enrollment,
    /// Set only on the recompute that first reached 100%
    pub newly_completed: bool,
}

/// Folds a snapshot into the cached enrollment. Completion is sticky: once an
/// enrollment is completed it stays completed even if the catalog later
/// grows. Only active enrollments can complete.
pub fn fold_snapshot(
    enrollment: &Enrollment,
    snapshot: AggregateSnapshot,
    now: DateTime<Utc>,
) -> AggregateOutcome {
    let mut next = enrollment.clone();
    next.overall_percentage = snapshot.overall_percentage;
    next.completed_unit_ids = snapshot.completed_unit_ids;

    let newly_completed =
        snapshot.overall_percentage >= 100 && enrollment.is_active();
    if newly_completed {
        next.status = EnrollmentStatus::Completed;
        next.completion_date = Some(now);
    }

    AggregateOutcome {
        enrollment: next,
        newly_completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stride_model::{EngagementSignals, ProgressStatus};

    fn record(unit: &str, status: ProgressStatus) -> ProgressRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ProgressRecord {
            learner_id: "l1".into(),
            course_id: "c1".into(),
            unit_id: unit.into(),
            watch_time_seconds: 10.0,
            total_duration_seconds: 100.0,
            completion_percentage: 10.0,
            status,
            resume_position_seconds: 10.0,
            first_seen_at: at,
            last_seen_at: at,
            completed_at: status.is_completed().then_some(at),
            engagement_signals: EngagementSignals::default(),
            archived_at: None,
            version: 1,
        }
    }

    fn units(ids: &[&str]) -> Vec<UnitId> {
        ids.iter().map(|id| UnitId::from(*id)).collect()
    }

    #[test]
    fn percentage_rounds_and_handles_empty_courses() {
        assert_eq!(overall_percentage(0, 0), 0);
        assert_eq!(overall_percentage(1, 2), 50);
        assert_eq!(overall_percentage(1, 3), 33);
        assert_eq!(overall_percentage(2, 3), 67);
        assert_eq!(overall_percentage(3, 3), 100);
    }

    #[test]
    fn only_completed_mandatory_units_count() {
        let records = vec![
            record("u1", ProgressStatus::Completed),
            record("u2", ProgressStatus::InProgress),
            record("optional", ProgressStatus::Completed),
        ];
        let snapshot = aggregate(&units(&["u1", "u2"]), &records);
        assert_eq!(snapshot.overall_percentage, 50);
        assert_eq!(snapshot.completed_unit_ids.len(), 1);
    }

    #[test]
    fn archived_records_are_ignored() {
        let mut archived = record("u1", ProgressStatus::Completed);
        archived.archived_at = Some(Utc::now());
        let snapshot = aggregate(&units(&["u1"]), &[archived]);
        assert_eq!(snapshot.overall_percentage, 0);
    }

    #[test]
    fn reaching_full_completion_flips_status_once() {
        let enrollment = Enrollment::new("l1".into(), "c1".into());
        let records = vec![record("u1", ProgressStatus::Completed)];
        let now = Utc::now();

        let first = fold_snapshot(&enrollment, aggregate(&units(&["u1"]), &records), now);
        assert!(first.newly_completed);
        assert_eq!(first.enrollment.status, EnrollmentStatus::Completed);
        assert_eq!(first.enrollment.completion_date, Some(now));

        let again = fold_snapshot(
            &first.enrollment,
            aggregate(&units(&["u1"]), &records),
            now + chrono::Duration::minutes(5),
        );
        assert!(!again.newly_completed);
        assert_eq!(again.enrollment, first.enrollment);
    }
}
