//! In-memory application harness for HTTP tests.
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use stride_core::application::{ProgressService, ProgressUnitOfWorkBuilder};
use stride_core::database::infrastructure::memory::{
    InMemoryEnrollmentStore, InMemoryProgressRepository, InMemoryUnitCatalog,
};
use stride_model::{CourseId, Enrollment, LearnerId};
use stride_server::{
    AppState, create_app,
    infra::{
        config::{Config, StorageBackend},
        seed::SeedFile,
    },
};

pub const LEARNER: &str = "learner-1";
pub const OTHER_LEARNER: &str = "learner-2";
pub const COURSE: &str = "rust-101";

/// Two mandatory 500s units and one optional unit, learner-1 and learner-2
/// both enrolled.
const SEED: &str = r#"
    [[courses]]
    id = "rust-101"

    [[courses.units]]
    id = "intro"
    title = "Why Rust"
    duration_seconds = 500

    [[courses.units]]
    id = "advanced"
    title = "Lifetimes"
    duration_seconds = 500

    [[courses.units]]
    id = "bonus"
    duration_seconds = 300
    mandatory = false

    [[enrollments]]
    learner_id = "learner-1"
    course_id = "rust-101"

    [[enrollments]]
    learner_id = "learner-2"
    course_id = "rust-101"
"#;

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub progress: InMemoryProgressRepository,
    pub enrollments: InMemoryEnrollmentStore,
    pub catalog: InMemoryUnitCatalog,
}

impl TestApp {
    /// Enrollment of `learner` in the seeded course
    pub fn enrollment_of(&self, learner: &str) -> Enrollment {
        self.enrollments
            .enroll(LearnerId::from(learner), CourseId::from(COURSE))
    }
}

pub fn build_test_app() -> Result<TestApp> {
    let progress = InMemoryProgressRepository::new();
    let enrollments = InMemoryEnrollmentStore::new();
    let catalog = InMemoryUnitCatalog::new();

    let seed: SeedFile = toml::from_str(SEED)?;
    seed.apply(&catalog, &enrollments);

    let config = Arc::new(Config::default());
    let uow = ProgressUnitOfWorkBuilder::new()
        .with_memory(progress.clone(), enrollments.clone(), catalog.clone())
        .build()
        .map_err(|err| anyhow!("failed to build unit of work: {err}"))?;
    let service =
        ProgressService::new(uow, config.engine.clone(), config.analytics.clone());
    let state = AppState::new(service, config, StorageBackend::Memory, None);

    let server = TestServer::new(create_app(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        state,
        progress,
        enrollments,
        catalog,
    })
}

pub fn learner_header() -> HeaderName {
    HeaderName::from_static("x-learner-id")
}

pub fn learner(value: &'static str) -> HeaderValue {
    HeaderValue::from_static(value)
}
