use stride_model::{CourseId, LearnerId, ModelError, UnitId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Learner {learner_id} has no active enrollment in course {course_id}")]
    NotEnrolled {
        learner_id: LearnerId,
        course_id: CourseId,
    },

    #[error("Unit {unit_id} not found in course {course_id}")]
    UnitNotFound { course_id: CourseId, unit_id: UnitId },

    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(String),

    #[error("Invalid analytics window: {0}")]
    InvalidWindow(String),

    #[error(
        "Write conflict on progress for learner {learner_id} unit {unit_id} after {attempts} attempts"
    )]
    Conflict {
        learner_id: LearnerId,
        unit_id: UnitId,
        attempts: u32,
    },

    #[error("Notification failed: {0}")]
    Notification(String),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProgressError {
    /// Short machine-readable label, used in batch results and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressError::InvalidSample(_) => "invalid_sample",
            ProgressError::NotEnrolled { .. } => "not_enrolled",
            ProgressError::UnitNotFound { .. } => "unit_not_found",
            ProgressError::EnrollmentNotFound(_) => "enrollment_not_found",
            ProgressError::InvalidWindow(_) => "invalid_window",
            ProgressError::Conflict { .. } => "conflict",
            ProgressError::Notification(_) => "notification",
            #[cfg(feature = "database")]
            ProgressError::Database(_) => "database",
            ProgressError::Serialization(_) => "serialization",
            ProgressError::Internal(_) => "internal",
        }
    }
}

impl From<ModelError> for ProgressError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidWindow(msg) => ProgressError::InvalidWindow(msg),
            ModelError::InvalidId(msg) => ProgressError::InvalidSample(msg),
            ModelError::UnknownStatus(value) => {
                ProgressError::Internal(format!("unknown status {value}"))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;
