use std::collections::HashMap;

use stride_model::{CatalogUnit, DailyActivityBucket, ProgressRecord, UnitId};

use crate::settings::AnalyticsSettings;

/// Suggested session length from the learner's recent active days.
///
/// Average minutes over the most recent `recent_active_days` active days,
/// rounded to the nearest five and clamped to the configured range.
pub fn optimal_session_minutes(
    buckets: &[DailyActivityBucket],
    settings: &AnalyticsSettings,
) -> u32 {
    let recent: Vec<f64> = buckets
        .iter()
        .rev()
        .filter(|bucket| bucket.is_active())
        .take(settings.recent_active_days)
        .map(|bucket| bucket.minutes_active)
        .collect();

    if recent.is_empty() {
        return settings.default_session_minutes;
    }

    let average = recent.iter().sum::<f64>() / recent.len() as f64;
    let rounded = ((average / 5.0).round() * 5.0) as u32;
    rounded.clamp(settings.min_session_minutes, settings.max_session_minutes)
}

/// First unit in catalog order the learner has not completed
pub fn next_unit(catalog: &[CatalogUnit], records: &[ProgressRecord]) -> Option<UnitId> {
    let status_by_unit: HashMap<&UnitId, &ProgressRecord> = records
        .iter()
        .filter(|record| !record.is_archived())
        .map(|record| (&record.unit_id, record))
        .collect();

    let mut ordered: Vec<&CatalogUnit> = catalog.iter().collect();
    ordered.sort_by_key(|unit| unit.position);

    ordered
        .into_iter()
        .find(|unit| {
            status_by_unit
                .get(&unit.unit_id)
                .is_none_or(|record| record.status.is_open())
        })
        .map(|unit| unit.unit_id.clone())
}

/// Days left at the learner's current pace: remaining mandatory units over
/// units completed per active day, rounded up. `None` when there is no pace
/// to extrapolate from.
pub fn projected_days_to_complete(
    catalog: &[CatalogUnit],
    records: &[ProgressRecord],
    units_completed: u32,
    active_days: u32,
) -> Option<u32> {
    let completed: Vec<&UnitId> = records
        .iter()
        .filter(|record| !record.is_archived() && record.is_completed())
        .map(|record| &record.unit_id)
        .collect();
    let remaining = catalog
        .iter()
        .filter(|unit| unit.is_mandatory && !completed.contains(&&unit.unit_id))
        .count();

    if remaining == 0 {
        return Some(0);
    }
    if units_completed == 0 || active_days == 0 {
        return None;
    }

    // remaining / (completed / active) == remaining * active / completed
    let remaining = remaining as u32;
    Some((remaining * active_days).div_ceil(units_completed))
}
