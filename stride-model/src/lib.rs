//! Core data model definitions shared across Stride crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod analytics;
pub mod api;
pub mod batch;
pub mod enrollment;
pub mod error;
pub mod ids;
pub mod progress;

pub use analytics::{
    AnalyticsReport, AnalyticsWindow, DailyActivityBucket, EngagementBreakdown,
    Recommendations, StreakSummary,
};
pub use api::{
    ApiResponse, ArchiveResponse, BatchProgressRequest, RecordProgressRequest,
};
pub use batch::{BatchItem, BatchItemResult, BatchOutcome};
pub use enrollment::{Enrollment, EnrollmentProgress, EnrollmentStatus};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{CourseId, EnrollmentId, LearnerId, ProgressKey, UnitId};
pub use progress::{
    CatalogUnit, EngagementSignals, ProgressRecord, ProgressStatus, SignalCounts,
    SignalSample, SpeedBuckets, UnitCriteria, UnitProgressSummary, WatchSample,
};
