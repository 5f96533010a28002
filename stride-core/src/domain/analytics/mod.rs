//! Read-side analytics over a learner's progress history.
//!
//! Everything here is pure: callers load the records and catalog, this module
//! only folds them into an [`AnalyticsReport`].

pub mod buckets;
pub mod recommendations;
pub mod scoring;
pub mod streaks;

pub use buckets::daily_buckets;

use stride_model::{
    AnalyticsReport, AnalyticsWindow, CatalogUnit, CourseId, LearnerId,
    ProgressRecord, Recommendations,
};

use crate::settings::AnalyticsSettings;

/// Inputs for one report. `catalog` is only consulted for course-scoped
/// reports and may be empty otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsInput<'a> {
    pub learner_id: &'a LearnerId,
    pub course_id: Option<&'a CourseId>,
    pub window: AnalyticsWindow,
    pub records: &'a [ProgressRecord],
    pub catalog: &'a [CatalogUnit],
}

pub fn build_report(
    input: &AnalyticsInput<'_>,
    settings: &AnalyticsSettings,
) -> AnalyticsReport {
    let window = input.window;
    let live: Vec<&ProgressRecord> = input
        .records
        .iter()
        .filter(|record| !record.is_archived())
        .filter(|record| input.course_id.is_none_or(|course| &record.course_id == course))
        .collect();
    let scoped: Vec<ProgressRecord> = live.iter().map(|record| (*record).clone()).collect();

    let daily_activity = daily_buckets(&scoped, &window);
    let touched: Vec<&ProgressRecord> = live
        .iter()
        .copied()
        .filter(|record| window.contains(record.last_seen_at.date_naive()))
        .collect();

    let active_days = daily_activity.iter().filter(|b| b.is_active()).count() as u32;
    let total_minutes = daily_activity.iter().map(|b| b.minutes_active).sum();
    let units_completed = daily_activity.iter().map(|b| b.units_completed).sum();
    let units_near_completion = live
        .iter()
        .filter(|record| record.is_near_completion(settings.near_completion_percentage))
        .count() as u32;

    let first_activity = live
        .iter()
        .map(|record| record.first_seen_at.date_naive())
        .min();
    let engagement = scoring::blend(
        scoring::completion_ratio(&touched),
        scoring::consistency(&daily_activity, first_activity, window.start, window.end),
        scoring::interaction_density(&touched, settings.interaction_target_per_unit),
    );

    let (next_unit, projected_days_to_complete) = match input.course_id {
        Some(_) => (
            recommendations::next_unit(input.catalog, &scoped),
            recommendations::projected_days_to_complete(
                input.catalog,
                &scoped,
                units_completed,
                active_days,
            ),
        ),
        None => (None, None),
    };

    AnalyticsReport {
        learner_id: input.learner_id.clone(),
        course_id: input.course_id.cloned(),
        window,
        active_days,
        total_minutes,
        units_touched: touched.len() as u32,
        units_completed,
        units_near_completion,
        streak: streaks::summarize(&daily_activity),
        engagement,
        attention_score: scoring::attention_score(&touched),
        average_buffer_health_pct: scoring::average_buffer_health(&touched),
        recommendations: Recommendations {
            optimal_session_minutes: recommendations::optimal_session_minutes(
                &daily_activity,
                settings,
            ),
            next_unit,
            projected_days_to_complete,
        },
        daily_activity,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveTime};
    use stride_model::{
        CatalogUnit, CourseId, EngagementSignals, LearnerId, ProgressRecord,
        ProgressStatus, UnitId,
    };

    pub fn record_seen(
        unit: &str,
        day: NaiveDate,
        watch_secs: f64,
        completed: bool,
    ) -> ProgressRecord {
        let seen = day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()).and_utc();
        let total = 600.0_f64.max(watch_secs);
        ProgressRecord {
            learner_id: LearnerId::from("learner-1"),
            course_id: CourseId::from("course-1"),
            unit_id: UnitId::from(unit),
            watch_time_seconds: watch_secs,
            total_duration_seconds: total,
            completion_percentage: if completed {
                100.0
            } else {
                (watch_secs * 100.0 / total).min(100.0)
            },
            status: if completed {
                ProgressStatus::Completed
            } else if watch_secs > 0.0 {
                ProgressStatus::InProgress
            } else {
                ProgressStatus::NotStarted
            },
            resume_position_seconds: watch_secs,
            first_seen_at: seen,
            last_seen_at: seen,
            completed_at: completed.then_some(seen),
            engagement_signals: EngagementSignals::default(),
            archived_at: None,
            version: 1,
        }
    }

    pub fn catalog_unit(unit: &str, position: u32, is_mandatory: bool) -> CatalogUnit {
        CatalogUnit {
            course_id: CourseId::from("course-1"),
            unit_id: UnitId::from(unit),
            title: None,
            position,
            total_duration_seconds: 600.0,
            minimum_watch_percentage: None,
            is_mandatory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{catalog_unit, record_seen};
    use super::*;
    use chrono::NaiveDate;
    use stride_model::UnitId;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn course_report_combines_all_sections() {
        let learner = LearnerId::from("learner-1");
        let course = CourseId::from("course-1");
        let catalog: Vec<CatalogUnit> =
            (0..4).map(|i| catalog_unit(&format!("u{i}"), i, true)).collect();

        let mut focused = record_seen("u1", day(2), 1200.0, true);
        focused.engagement_signals.counts.focused_samples = 8;
        focused.engagement_signals.counts.unfocused_samples = 2;
        focused.engagement_signals.counts.buffer_health_ewma = Some(90.0);
        let mut archived = record_seen("u3", day(3), 600.0, true);
        archived.archived_at = Some(archived.last_seen_at);
        let records = vec![
            record_seen("u0", day(1), 600.0, true),
            focused,
            record_seen("u2", day(3), 580.0, false),
            archived,
        ];

        let input = AnalyticsInput {
            learner_id: &learner,
            course_id: Some(&course),
            window: AnalyticsWindow::new(day(1), day(3)).unwrap(),
            records: &records,
            catalog: &catalog,
        };
        let report = build_report(&input, &AnalyticsSettings::default());

        assert_eq!(report.daily_activity.len(), 3);
        assert_eq!(report.active_days, 3);
        assert_eq!(report.units_touched, 3);
        assert_eq!(report.units_completed, 2);
        // 580 / 600 = 96.7%
        assert_eq!(report.units_near_completion, 1);
        assert_eq!(report.streak.current, 3);
        assert_eq!(report.attention_score, 80.0);
        assert_eq!(report.average_buffer_health_pct, Some(90.0));
        assert_eq!(report.recommendations.next_unit, Some(UnitId::from("u2")));
        // two remaining at 2 completions over 3 active days
        assert_eq!(report.recommendations.projected_days_to_complete, Some(3));
        assert!(report.engagement.score > 0.0 && report.engagement.score <= 100.0);
    }

    #[test]
    fn learner_wide_report_skips_course_recommendations() {
        let learner = LearnerId::from("learner-1");
        let records = vec![record_seen("u0", day(1), 600.0, false)];
        let input = AnalyticsInput {
            learner_id: &learner,
            course_id: None,
            window: AnalyticsWindow::new(day(1), day(2)).unwrap(),
            records: &records,
            catalog: &[],
        };
        let report = build_report(&input, &AnalyticsSettings::default());

        assert_eq!(report.recommendations.next_unit, None);
        assert_eq!(report.recommendations.projected_days_to_complete, None);
        assert_eq!(report.streak.current, 0);
        assert_eq!(report.streak.longest, 1);
        assert_eq!(report.recommendations.optimal_session_minutes, 10);
    }

    #[test]
    fn empty_history_yields_neutral_report() {
        let learner = LearnerId::from("learner-1");
        let input = AnalyticsInput {
            learner_id: &learner,
            course_id: None,
            window: AnalyticsWindow::new(day(1), day(7)).unwrap(),
            records: &[],
            catalog: &[],
        };
        let report = build_report(&input, &AnalyticsSettings::default());
        assert_eq!(report.daily_activity.len(), 7);
        assert_eq!(report.active_days, 0);
        assert_eq!(report.engagement.score, 0.0);
        assert_eq!(report.attention_score, 0.0);
        assert_eq!(report.average_buffer_health_pct, None);
        assert_eq!(report.recommendations.optimal_session_minutes, 25);
    }
}
