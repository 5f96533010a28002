//! Tunables for ingestion and analytics.
//!
//! Both structs deserialize with `#[serde(default)]` so a config file only
//! needs to name the fields it overrides.

use serde::{Deserialize, Serialize};
use stride_model::UnitCriteria;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Completion threshold for units whose catalog entry has no override
    pub default_minimum_watch_percentage: f64,
    /// In-progress units at or above this percentage count as "near completion"
    pub near_completion_percentage: f64,
    /// Read-modify-write attempts before a write surfaces as a conflict
    pub max_write_attempts: u32,
    /// Batch items processed concurrently
    pub batch_concurrency: usize,
    /// Largest batch accepted in one request
    pub max_batch_items: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_minimum_watch_percentage:
                UnitCriteria::DEFAULT_MINIMUM_WATCH_PERCENTAGE,
            near_completion_percentage: 95.0,
            max_write_attempts: 5,
            batch_concurrency: 8,
            max_batch_items: 500,
        }
    }
}

impl EngineSettings {
    /// Returns one message per violated guard rail
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(self.default_minimum_watch_percentage > 0.0
            && self.default_minimum_watch_percentage <= 100.0)
        {
            problems.push(format!(
                "engine.default_minimum_watch_percentage must be in (0, 100], got {}",
                self.default_minimum_watch_percentage
            ));
        }
        if !(self.near_completion_percentage > 0.0
            && self.near_completion_percentage <= 100.0)
        {
            problems.push(format!(
                "engine.near_completion_percentage must be in (0, 100], got {}",
                self.near_completion_percentage
            ));
        }
        if self.max_write_attempts == 0 {
            problems.push("engine.max_write_attempts must be at least 1".into());
        }
        if self.batch_concurrency == 0 {
            problems.push("engine.batch_concurrency must be at least 1".into());
        }
        if self.max_batch_items == 0 {
            problems.push("engine.max_batch_items must be at least 1".into());
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Longest window a single report may cover
    pub max_window_days: u32,
    /// Focus/speed-change signals per touched unit that count as full density
    pub interaction_target_per_unit: u32,
    /// Active days considered when averaging session length
    pub recent_active_days: usize,
    pub default_session_minutes: u32,
    pub min_session_minutes: u32,
    pub max_session_minutes: u32,
    /// Threshold reused for `units_near_completion`
    pub near_completion_percentage: f64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            max_window_days: 366,
            interaction_target_per_unit: 10,
            recent_active_days: 7,
            default_session_minutes: 25,
            min_session_minutes: 10,
            max_session_minutes: 60,
            near_completion_percentage: 95.0,
        }
    }
}

impl AnalyticsSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.max_window_days == 0 {
            problems.push("analytics.max_window_days must be at least 1".into());
        }
        if self.interaction_target_per_unit == 0 {
            problems.push(
                "analytics.interaction_target_per_unit must be at least 1".into(),
            );
        }
        if self.recent_active_days == 0 {
            problems.push("analytics.recent_active_days must be at least 1".into());
        }
        if self.min_session_minutes > self.max_session_minutes {
            problems.push(format!(
                "analytics.min_session_minutes ({}) exceeds max_session_minutes ({})",
                self.min_session_minutes, self.max_session_minutes
            ));
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(EngineSettings::default().validate().is_empty());
        assert!(AnalyticsSettings::default().validate().is_empty());
    }

    #[test]
    fn out_of_range_threshold_is_reported() {
        let settings = EngineSettings {
            default_minimum_watch_percentage: 120.0,
            max_write_attempts: 0,
            ..EngineSettings::default()
        };
        assert_eq!(settings.validate().len(), 2);
    }
}
