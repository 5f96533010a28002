use std::collections::BTreeMap;

use chrono::NaiveDate;
use stride_model::{AnalyticsWindow, DailyActivityBucket, ProgressRecord};

/// Attribute progress history to calendar days.
///
/// Only final per-unit state is stored, so each record contributes its whole
/// watch time and one touched unit to the day it was last seen, and one
/// completed unit to the day it completed. Every day of the window gets a
/// bucket, active or not, oldest first.
pub fn daily_buckets(
    records: &[ProgressRecord],
    window: &AnalyticsWindow,
) -> Vec<DailyActivityBucket> {
    let mut by_day: BTreeMap<NaiveDate, DailyActivityBucket> = window
        .days()
        .map(|date| (date, DailyActivityBucket::empty(date)))
        .collect();

    for record in records.iter().filter(|record| !record.is_archived()) {
        let seen_on = record.last_seen_at.date_naive();
        if let Some(bucket) = by_day.get_mut(&seen_on) {
            bucket.minutes_active += record.minutes_watched();
            bucket.units_touched += 1;
        }

        if let Some(completed_at) = record.completed_at
            && let Some(bucket) = by_day.get_mut(&completed_at.date_naive())
        {
            bucket.units_completed += 1;
        }
    }

    by_day.into_values().collect()
}
