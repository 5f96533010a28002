use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{CourseId, EnrollmentId, LearnerId, UnitId};
use crate::progress::UnitProgressSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    /// Left the course; progress is archived and no longer accepted
    Withdrawn,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "withdrawn" => Ok(EnrollmentStatus::Withdrawn),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}

/// A learner's relationship to a course.
///
/// `overall_percentage` and `completed_unit_ids` are a cache derived from the
/// learner's progress records for the course's mandatory units; they can
/// always be rebuilt from those records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub overall_percentage: u8,
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub completed_unit_ids: BTreeSet<UnitId>,
    pub completion_date: Option<DateTime<Utc>>,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Fresh active enrollment with no progress
    pub fn new(learner_id: LearnerId, course_id: CourseId) -> Self {
        Self {
            id: EnrollmentId::new(),
            learner_id,
            course_id,
            overall_percentage: 0,
            status: EnrollmentStatus::Active,
            completed_unit_ids: BTreeSet::new(),
            completion_date: None,
            enrolled_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, EnrollmentStatus::Active)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, EnrollmentStatus::Completed)
    }

    pub fn is_withdrawn(&self) -> bool {
        matches!(self.status, EnrollmentStatus::Withdrawn)
    }
}

/// Enrollment plus per-unit summaries, served to dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentProgress {
    pub enrollment: Enrollment,
    pub units: Vec<UnitProgressSummary>,
}
