use chrono::NaiveDate;
use stride_model::{DailyActivityBucket, EngagementBreakdown, ProgressRecord};

const COMPLETION_WEIGHT: f64 = 0.4;
const CONSISTENCY_WEIGHT: f64 = 0.3;
const INTERACTION_WEIGHT: f64 = 0.3;

fn clamp_pct(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Completed share of the units touched in the window
pub fn completion_ratio(touched: &[&ProgressRecord]) -> f64 {
    if touched.is_empty() {
        return 0.0;
    }
    let completed = touched.iter().filter(|record| record.is_completed()).count();
    clamp_pct(completed as f64 * 100.0 / touched.len() as f64)
}

/// Active days over days elapsed since the learner's first activity (or the
/// window start, whichever is later), both ends inclusive
pub fn consistency(
    buckets: &[DailyActivityBucket],
    first_activity: Option<NaiveDate>,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> f64 {
    let Some(first) = first_activity else {
        return 0.0;
    };
    let from = first.max(window_start);
    let elapsed = (window_end - from).num_days() + 1;
    if elapsed <= 0 {
        return 0.0;
    }
    let active = buckets
        .iter()
        .filter(|bucket| bucket.is_active() && bucket.date >= from)
        .count();
    clamp_pct(active as f64 * 100.0 / elapsed as f64)
}

/// Focus and speed-change signals relative to a per-unit target, capped at 100
pub fn interaction_density(touched: &[&ProgressRecord], target_per_unit: u32) -> f64 {
    if touched.is_empty() || target_per_unit == 0 {
        return 0.0;
    }
    let interactions: u64 = touched
        .iter()
        .map(|record| u64::from(record.engagement_signals.interaction_count()))
        .sum();
    let expected = touched.len() as f64 * f64::from(target_per_unit);
    clamp_pct(interactions as f64 * 100.0 / expected)
}

pub fn blend(completion: f64, consistency: f64, interaction: f64) -> EngagementBreakdown {
    let completion_ratio = clamp_pct(completion);
    let consistency = clamp_pct(consistency);
    let interaction_density = clamp_pct(interaction);
    let score = COMPLETION_WEIGHT * completion_ratio
        + CONSISTENCY_WEIGHT * consistency
        + INTERACTION_WEIGHT * interaction_density;

    EngagementBreakdown {
        completion_ratio,
        consistency,
        interaction_density,
        score: clamp_pct(score),
    }
}

/// Share of focused samples across the touched units, 0-100
pub fn attention_score(touched: &[&ProgressRecord]) -> f64 {
    let (focused, total) = touched.iter().fold((0u64, 0u64), |(focused, total), record| {
        let signals = &record.engagement_signals;
        (
            focused + u64::from(signals.counts.focused_samples),
            total + u64::from(signals.total_samples()),
        )
    });
    if total == 0 {
        return 0.0;
    }
    clamp_pct(focused as f64 * 100.0 / total as f64)
}

pub fn average_buffer_health(touched: &[&ProgressRecord]) -> Option<f64> {
    let samples: Vec<f64> = touched
        .iter()
        .filter_map(|record| record.engagement_signals.counts.buffer_health_ewma)
        .collect();
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}
