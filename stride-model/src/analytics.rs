//! Read-side analytics shapes derived from progress history.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::{CourseId, LearnerId, UnitId};

/// Inclusive range of calendar days (UTC) an analytics report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalyticsWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ModelError::InvalidWindow(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of `days` calendar days ending on `end`
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    /// Number of calendar days covered, inclusive of both ends
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let start = self.start;
        (0..self.len_days()).map(move |offset| start + Duration::days(offset))
    }
}

/// Activity attributed to one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivityBucket {
    pub date: NaiveDate,
    pub minutes_active: f64,
    pub units_touched: u32,
    pub units_completed: u32,
}

impl DailyActivityBucket {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            minutes_active: 0.0,
            units_touched: 0,
            units_completed: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.minutes_active > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
}

/// Engagement score and its three components, each 0-100
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementBreakdown {
    pub completion_ratio: f64,
    pub consistency: f64,
    pub interaction_density: f64,
    pub score: f64,
}

/// Deterministic heuristics; not personalised predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub optimal_session_minutes: u32,
    pub next_unit: Option<UnitId>,
    pub projected_days_to_complete: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub learner_id: LearnerId,
    pub course_id: Option<CourseId>,
    pub window: AnalyticsWindow,
    /// One bucket per calendar day of the window, oldest first
    pub daily_activity: Vec<DailyActivityBucket>,
    pub active_days: u32,
    pub total_minutes: f64,
    pub units_touched: u32,
    pub units_completed: u32,
    pub units_near_completion: u32,
    pub streak: StreakSummary,
    pub engagement: EngagementBreakdown,
    pub attention_score: f64,
    pub average_buffer_health_pct: Option<f64>,
    pub recommendations: Recommendations,
}
