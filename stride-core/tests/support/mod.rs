//! Shared harness for core integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use stride_core::application::{ProgressService, ProgressUnitOfWorkBuilder};
use stride_core::database::ProgressRepository;
use stride_core::database::infrastructure::memory::{
    InMemoryEnrollmentStore, InMemoryProgressRepository, InMemoryUnitCatalog,
};
use stride_core::settings::{AnalyticsSettings, EngineSettings};
use stride_model::{CatalogUnit, CourseId, LearnerId, WatchSample};

pub const COURSE: &str = "rust-101";
pub const LEARNER: &str = "learner-1";

pub struct Harness {
    pub service: ProgressService,
    pub progress: InMemoryProgressRepository,
    pub enrollments: InMemoryEnrollmentStore,
    pub catalog: InMemoryUnitCatalog,
    pub learner: LearnerId,
    pub course: CourseId,
}

impl Harness {
    /// Enrolled learner in a course whose units are all 500s long
    pub fn new(units: &[(&str, bool)]) -> Self {
        Self::with_settings(units, EngineSettings::default())
    }

    pub fn with_settings(units: &[(&str, bool)], engine: EngineSettings) -> Self {
        Self::with_progress_adapter(units, engine, |progress| Arc::new(progress))
    }

    /// Same harness, with the progress repository seen through `adapt`
    pub fn with_progress_adapter(
        units: &[(&str, bool)],
        engine: EngineSettings,
        adapt: impl FnOnce(InMemoryProgressRepository) -> Arc<dyn ProgressRepository>,
    ) -> Self {
        let progress = InMemoryProgressRepository::new();
        let enrollments = InMemoryEnrollmentStore::new();
        let catalog = InMemoryUnitCatalog::new();
        let learner = LearnerId::from(LEARNER);
        let course = CourseId::from(COURSE);

        for (position, (unit_id, is_mandatory)) in units.iter().enumerate() {
            catalog.upsert_unit(CatalogUnit {
                course_id: course.clone(),
                unit_id: (*unit_id).into(),
                title: Some(format!("Lecture {unit_id}")),
                position: position as u32,
                total_duration_seconds: 500.0,
                minimum_watch_percentage: None,
                is_mandatory: *is_mandatory,
            });
        }
        enrollments.enroll(learner.clone(), course.clone());

        let uow = ProgressUnitOfWorkBuilder::new()
            .with_progress(adapt(progress.clone()))
            .with_enrollments(Arc::new(enrollments.clone()))
            .with_catalog(Arc::new(catalog.clone()))
            .build()
            .expect("unit of work");

        Self {
            service: ProgressService::new(uow, engine, AnalyticsSettings::default()),
            progress,
            enrollments,
            catalog,
            learner,
            course,
        }
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
}

/// Sample observed `offset_secs` after [`base_time`]
pub fn sample(position: f64, offset_secs: i64) -> WatchSample {
    WatchSample::at(position, 500.0, base_time() + Duration::seconds(offset_secs))
}
