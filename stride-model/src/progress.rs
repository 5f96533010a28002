//! Per-unit progress records and the samples that feed them.
//!
//! A [`ProgressRecord`] exists once per (learner, unit) pair and only ever
//! moves forward: `watch_time_seconds` is a high-water mark and a
//! `Completed` status is terminal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{CourseId, LearnerId, ProgressKey, UnitId};

/// Completion state of a single unit for a single learner
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProgressStatus::Completed)
    }

    /// Units a learner can still make progress on
    pub fn is_open(&self) -> bool {
        !self.is_completed()
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ProgressStatus::NotStarted),
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

fn default_focused() -> bool {
    true
}

fn default_playback_speed() -> f64 {
    1.0
}

fn default_buffer_health() -> f64 {
    100.0
}

/// A single playback observation reported by a client.
///
/// Clients report the playhead position every few seconds while playing, and
/// buffer samples while offline to flush them later as a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSample {
    /// Playhead position at `observed_at`, in seconds
    pub current_position_seconds: f64,
    /// Unit length as known by the client, in seconds
    pub total_duration_seconds: f64,
    #[serde(default = "default_focused")]
    pub is_focused: bool,
    #[serde(default = "default_playback_speed")]
    pub playback_speed: f64,
    #[serde(default = "default_buffer_health")]
    pub buffer_health_pct: f64,
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

impl WatchSample {
    /// Minimal sample with neutral engagement signals
    pub fn at(
        current_position_seconds: f64,
        total_duration_seconds: f64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            current_position_seconds,
            total_duration_seconds,
            is_focused: default_focused(),
            playback_speed: default_playback_speed(),
            buffer_health_pct: default_buffer_health(),
            observed_at,
        }
    }
}

/// Completion rules for one unit, resolved from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCriteria {
    pub total_duration_seconds: f64,
    /// Percentage of the unit that must be reached to complete it
    pub minimum_watch_percentage: f64,
    pub is_mandatory: bool,
}

impl UnitCriteria {
    pub const DEFAULT_MINIMUM_WATCH_PERCENTAGE: f64 = 80.0;

    pub fn new(total_duration_seconds: f64) -> Self {
        Self {
            total_duration_seconds,
            minimum_watch_percentage: Self::DEFAULT_MINIMUM_WATCH_PERCENTAGE,
            is_mandatory: true,
        }
    }

    pub fn with_minimum_watch_percentage(mut self, percentage: f64) -> Self {
        self.minimum_watch_percentage = percentage;
        self
    }
}

/// A unit as listed by the course catalog, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogUnit {
    pub course_id: CourseId,
    pub unit_id: UnitId,
    #[serde(default)]
    pub title: Option<String>,
    /// Zero-based position within the course
    pub position: u32,
    pub total_duration_seconds: f64,
    /// Per-unit override; falls back to the engine default when absent
    #[serde(default)]
    pub minimum_watch_percentage: Option<f64>,
    #[serde(default = "default_mandatory")]
    pub is_mandatory: bool,
}

fn default_mandatory() -> bool {
    true
}

impl CatalogUnit {
    pub fn criteria(&self, default_minimum_watch_percentage: f64) -> UnitCriteria {
        UnitCriteria {
            total_duration_seconds: self.total_duration_seconds,
            minimum_watch_percentage: self
                .minimum_watch_percentage
                .unwrap_or(default_minimum_watch_percentage),
            is_mandatory: self.is_mandatory,
        }
    }
}

/// Sample counts per playback speed range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedBuckets {
    /// Below 1.0x
    pub slow: u32,
    /// Exactly 1.0x
    pub normal: u32,
    /// Above 1.0x up to 1.5x
    pub fast: u32,
    /// Above 1.5x
    pub very_fast: u32,
}

impl SpeedBuckets {
    pub fn total(&self) -> u32 {
        self.slow + self.normal + self.fast + self.very_fast
    }
}

/// Running engagement counts over a set of samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalCounts {
    pub focused_samples: u32,
    pub unfocused_samples: u32,
    pub speed_buckets: SpeedBuckets,
    /// Number of samples whose speed differed from the previous sample
    pub speed_changes: u32,
    pub last_playback_speed: Option<f64>,
    /// Exponentially weighted buffer health, 0-100
    pub buffer_health_ewma: Option<f64>,
}

impl SignalCounts {
    pub fn total_samples(&self) -> u32 {
        self.focused_samples + self.unfocused_samples
    }

    /// Share of samples where the player had focus, 0.0-1.0
    pub fn focus_ratio(&self) -> Option<f64> {
        let total = self.total_samples();
        (total > 0).then(|| f64::from(self.focused_samples) / f64::from(total))
    }

    /// Focus and speed-change events, used for interaction density
    pub fn interaction_count(&self) -> u32 {
        self.focused_samples + self.speed_changes
    }
}

/// Engagement fields of one sample, identified by its `observed_at`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    pub observed_at: DateTime<Utc>,
    pub is_focused: bool,
    pub playback_speed: f64,
    pub buffer_health_pct: f64,
}

impl From<&WatchSample> for SignalSample {
    fn from(sample: &WatchSample) -> Self {
        Self {
            observed_at: sample.observed_at,
            is_focused: sample.is_focused,
            playback_speed: sample.playback_speed,
            buffer_health_pct: sample.buffer_health_pct,
        }
    }
}

/// Bounded summary of the engagement signals seen for one unit.
///
/// `counts` covers every sample counted so far. The most recent samples are
/// kept in `window`, ordered by `observed_at`, so a replayed sample is
/// recognised and a late one lands in its place; samples pushed out of the
/// window are folded into `folded`, and anything at or before
/// `folded_until` counts as already seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementSignals {
    #[serde(flatten)]
    pub counts: SignalCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub window: Vec<SignalSample>,
    #[serde(default)]
    pub folded: SignalCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folded_until: Option<DateTime<Utc>>,
}

impl EngagementSignals {
    pub fn total_samples(&self) -> u32 {
        self.counts.total_samples()
    }

    pub fn focus_ratio(&self) -> Option<f64> {
        self.counts.focus_ratio()
    }

    pub fn interaction_count(&self) -> u32 {
        self.counts.interaction_count()
    }

    /// True when a sample observed at `at` is already part of the summary
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.folded_until.is_some_and(|until| at <= until)
            || self
                .window
                .binary_search_by(|sample| sample.observed_at.cmp(&at))
                .is_ok()
    }
}

/// Durable progress of one learner through one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub unit_id: UnitId,
    /// High-water mark of the reported playhead, never decreases
    pub watch_time_seconds: f64,
    pub total_duration_seconds: f64,
    pub completion_percentage: f64,
    pub status: ProgressStatus,
    /// Last reported playhead, used for "continue watching"
    pub resume_position_seconds: f64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub engagement_signals: EngagementSignals,
    /// Set when the owning enrollment was withdrawn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped on every persisted write
    #[serde(default)]
    pub version: u64,
}

impl ProgressRecord {
    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(self.learner_id.clone(), self.unit_id.clone())
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn is_near_completion(&self, threshold_percentage: f64) -> bool {
        !self.is_completed() && self.completion_percentage >= threshold_percentage
    }

    /// Watch time converted to minutes
    pub fn minutes_watched(&self) -> f64 {
        self.watch_time_seconds / 60.0
    }
}

/// Compact per-unit view returned alongside an enrollment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProgressSummary {
    pub unit_id: UnitId,
    pub status: ProgressStatus,
    pub completion_percentage: f64,
    pub watch_time_seconds: f64,
    pub resume_position_seconds: f64,
    pub last_seen_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&ProgressRecord> for UnitProgressSummary {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            unit_id: record.unit_id.clone(),
            status: record.status,
            completion_percentage: record.completion_percentage,
            watch_time_seconds: record.watch_time_seconds,
            resume_position_seconds: record.resume_position_seconds,
            last_seen_at: record.last_seen_at,
            completed_at: record.completed_at,
        }
    }
}
