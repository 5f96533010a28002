//! Completion state machine for a single progress record.
//!
//! `not_started -> in_progress -> completed`, with `completed` terminal.
//! Everything here is pure: the ingestor loads the existing record, calls
//! [`apply`], and persists the result.

use chrono::{DateTime, Utc};
use stride_model::{
    CourseId, EngagementSignals, LearnerId, ProgressRecord, ProgressStatus,
    SignalCounts, SignalSample, UnitCriteria, UnitId, WatchSample,
};
use tracing::debug;

use crate::error::{ProgressError, Result};

/// Smoothing factor for the buffer-health moving average
const BUFFER_HEALTH_ALPHA: f64 = 0.2;
const SPEED_EPSILON: f64 = 1e-6;
/// Samples kept individually before the oldest are folded into fixed counts
pub const SIGNAL_WINDOW: usize = 240;

/// Identity triple of the record being written
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitIdentity {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub unit_id: UnitId,
}

impl UnitIdentity {
    pub fn new(learner_id: LearnerId, course_id: CourseId, unit_id: UnitId) -> Self {
        Self {
            learner_id,
            course_id,
            unit_id,
        }
    }
}

/// Result of applying one sample
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub record: ProgressRecord,
    pub previous_status: Option<ProgressStatus>,
}

impl Applied {
    /// True only on the write that moved the record into `completed`
    pub fn newly_completed(&self) -> bool {
        self.record.is_completed()
            && self.previous_status != Some(ProgressStatus::Completed)
    }
}

/// Rejects samples that can never describe real playback
pub fn validate_sample(sample: &WatchSample) -> Result<()> {
    if !sample.current_position_seconds.is_finite()
        || sample.current_position_seconds < 0.0
    {
        return Err(ProgressError::InvalidSample(format!(
            "current_position_seconds must be a non-negative number, got {}",
            sample.current_position_seconds
        )));
    }
    if !sample.total_duration_seconds.is_finite()
        || sample.total_duration_seconds <= 0.0
    {
        return Err(ProgressError::InvalidSample(format!(
            "total_duration_seconds must be positive, got {}",
            sample.total_duration_seconds
        )));
    }
    if !sample.playback_speed.is_finite() || sample.playback_speed <= 0.0 {
        return Err(ProgressError::InvalidSample(format!(
            "playback_speed must be positive, got {}",
            sample.playback_speed
        )));
    }
    if !sample.buffer_health_pct.is_finite() {
        return Err(ProgressError::InvalidSample(
            "buffer_health_pct must be a number".to_string(),
        ));
    }
    Ok(())
}

/// `min(100, watch / total * 100)`
pub fn completion_percentage(watch_time_seconds: f64, total_duration_seconds: f64) -> f64 {
    if total_duration_seconds <= 0.0 {
        return 0.0;
    }
    (watch_time_seconds * 100.0 / total_duration_seconds).min(100.0)
}

/// Decide the next state of a progress record given one sample.
///
/// Every field is merged so that the result depends only on the set of
/// samples applied, not on their arrival order: watch time is a high-water
/// mark, the resume position follows the newest sample, `completed_at` is
/// the earliest sample that reached the threshold, and engagement signals
/// count each `observed_at` once. Re-applying a sample changes nothing.
pub fn apply(
    existing: Option<&ProgressRecord>,
    identity: &UnitIdentity,
    sample: &WatchSample,
    criteria: &UnitCriteria,
) -> Result<Applied> {
    validate_sample(sample)?;

    if let Some(current) = existing
        && current.course_id != identity.course_id
    {
        return Err(ProgressError::InvalidSample(format!(
            "unit {} is already tracked under course {}, not {}",
            identity.unit_id, current.course_id, identity.course_id
        )));
    }

    let total_duration_seconds = resolve_duration(existing, sample, criteria);
    let watch_time_seconds = existing
        .map(|record| record.watch_time_seconds)
        .unwrap_or(0.0)
        .max(sample.current_position_seconds);
    let completion_percentage =
        completion_percentage(watch_time_seconds, total_duration_seconds);

    let previous_status = existing.map(|record| record.status);
    let status = if previous_status == Some(ProgressStatus::Completed)
        || completion_percentage >= criteria.minimum_watch_percentage
    {
        ProgressStatus::Completed
    } else if completion_percentage > 0.0 {
        ProgressStatus::InProgress
    } else {
        ProgressStatus::NotStarted
    };

    let completed_at = resolve_completed_at(
        existing.and_then(|record| record.completed_at),
        sample,
        total_duration_seconds,
        criteria,
        status,
    );

    let record = match existing {
        None => ProgressRecord {
            learner_id: identity.learner_id.clone(),
            course_id: identity.course_id.clone(),
            unit_id: identity.unit_id.clone(),
            watch_time_seconds,
            total_duration_seconds,
            completion_percentage,
            status,
            resume_position_seconds: sample.current_position_seconds,
            first_seen_at: sample.observed_at,
            last_seen_at: sample.observed_at,
            completed_at,
            engagement_signals: merge_signals(&EngagementSignals::default(), sample),
            archived_at: None,
            version: 0,
        },
        Some(current) => {
            let resume_position_seconds = if sample.observed_at > current.last_seen_at {
                sample.current_position_seconds
            } else {
                current.resume_position_seconds
            };

            ProgressRecord {
                learner_id: current.learner_id.clone(),
                course_id: current.course_id.clone(),
                unit_id: current.unit_id.clone(),
                watch_time_seconds,
                total_duration_seconds,
                completion_percentage,
                status,
                resume_position_seconds,
                first_seen_at: current.first_seen_at.min(sample.observed_at),
                last_seen_at: current.last_seen_at.max(sample.observed_at),
                completed_at,
                engagement_signals: merge_signals(&current.engagement_signals, sample),
                archived_at: current.archived_at,
                version: current.version,
            }
        }
    };

    debug!(
        learner_id = %record.learner_id,
        unit_id = %record.unit_id,
        watch_time = record.watch_time_seconds,
        percentage = record.completion_percentage,
        status = %record.status,
        "applied watch sample"
    );

    Ok(Applied {
        record,
        previous_status,
    })
}

/// Earliest sample that reached the threshold on its own. A record that is
/// completed without such a sample (the catalog shortened the unit) is
/// stamped with the sample that observed it.
fn resolve_completed_at(
    existing: Option<DateTime<Utc>>,
    sample: &WatchSample,
    total_duration_seconds: f64,
    criteria: &UnitCriteria,
    status: ProgressStatus,
) -> Option<DateTime<Utc>> {
    let reached = completion_percentage(sample.current_position_seconds, total_duration_seconds)
        >= criteria.minimum_watch_percentage;
    match (existing, reached.then_some(sample.observed_at)) {
        (Some(current), Some(candidate)) => Some(current.min(candidate)),
        (Some(current), None) => Some(current),
        (None, candidate) => candidate.or(status.is_completed().then_some(sample.observed_at)),
    }
}

/// The catalog duration wins when it is known; it is the only source allowed
/// to correct a duration recorded on an earlier write.
fn resolve_duration(
    existing: Option<&ProgressRecord>,
    sample: &WatchSample,
    criteria: &UnitCriteria,
) -> f64 {
    if criteria.total_duration_seconds.is_finite()
        && criteria.total_duration_seconds > 0.0
    {
        if let Some(record) = existing
            && (record.total_duration_seconds - criteria.total_duration_seconds).abs()
                > f64::EPSILON
        {
            debug!(
                unit_id = %record.unit_id,
                recorded = record.total_duration_seconds,
                catalog = criteria.total_duration_seconds,
                "catalog corrected unit duration"
            );
        }
        return criteria.total_duration_seconds;
    }

    existing
        .map(|record| record.total_duration_seconds)
        .unwrap_or(sample.total_duration_seconds)
}

/// Adds a sample to the summary unless its `observed_at` is already covered.
/// Totals are rebuilt from the folded counts and the time-ordered window, so
/// arrival order does not matter within the window.
pub fn merge_signals(current: &EngagementSignals, sample: &WatchSample) -> EngagementSignals {
    if current.covers(sample.observed_at) {
        return current.clone();
    }

    let mut next = current.clone();
    let incoming = SignalSample::from(sample);
    let position = next
        .window
        .partition_point(|existing| existing.observed_at < incoming.observed_at);
    next.window.insert(position, incoming);

    if next.window.len() > SIGNAL_WINDOW {
        let overflow = next.window.len() - SIGNAL_WINDOW;
        for oldest in next.window.drain(..overflow) {
            count_sample(&mut next.folded, &oldest);
            next.folded_until = Some(oldest.observed_at);
        }
    }

    next.counts = next.window.iter().fold(next.folded, |mut counts, sample| {
        count_sample(&mut counts, sample);
        counts
    });
    next
}

fn count_sample(counts: &mut SignalCounts, sample: &SignalSample) {
    if sample.is_focused {
        counts.focused_samples = counts.focused_samples.saturating_add(1);
    } else {
        counts.unfocused_samples = counts.unfocused_samples.saturating_add(1);
    }

    let speed = sample.playback_speed;
    let buckets = &mut counts.speed_buckets;
    if (speed - 1.0).abs() <= SPEED_EPSILON {
        buckets.normal = buckets.normal.saturating_add(1);
    } else if speed < 1.0 {
        buckets.slow = buckets.slow.saturating_add(1);
    } else if speed <= 1.5 {
        buckets.fast = buckets.fast.saturating_add(1);
    } else {
        buckets.very_fast = buckets.very_fast.saturating_add(1);
    }

    if let Some(last) = counts.last_playback_speed
        && (last - speed).abs() > SPEED_EPSILON
    {
        counts.speed_changes = counts.speed_changes.saturating_add(1);
    }
    counts.last_playback_speed = Some(speed);

    let health = sample.buffer_health_pct.clamp(0.0, 100.0);
    counts.buffer_health_ewma = Some(match counts.buffer_health_ewma {
        Some(previous) => previous + BUFFER_HEALTH_ALPHA * (health - previous),
        None => health,
    });
}
