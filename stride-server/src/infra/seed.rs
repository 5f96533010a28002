//! TOML fixture that populates the in-memory backend at boot.
//!
//! ```toml
//! [[courses]]
//! id = "rust-101"
//!
//! [[courses.units]]
//! id = "ownership"
//! duration_seconds = 540
//! minimum_watch_percentage = 90
//!
//! [[enrollments]]
//! learner_id = "learner-1"
//! course_id = "rust-101"
//! ```

use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use stride_core::database::infrastructure::memory::{
    InMemoryEnrollmentStore, InMemoryUnitCatalog,
};
use stride_model::{CatalogUnit, CourseId, LearnerId, UnitId};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub courses: Vec<SeedCourse>,
    #[serde(default)]
    pub enrollments: Vec<SeedEnrollment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCourse {
    pub id: CourseId,
    #[serde(default)]
    pub units: Vec<SeedUnit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUnit {
    pub id: UnitId,
    #[serde(default)]
    pub title: Option<String>,
    pub duration_seconds: f64,
    #[serde(default)]
    pub minimum_watch_percentage: Option<f64>,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
}

fn default_mandatory() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEnrollment {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub courses: usize,
    pub units: usize,
    pub enrollments: usize,
}

impl SeedFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse seed file {}", path.display()))
    }

    /// Units keep the order they are listed in
    pub fn apply(
        &self,
        catalog: &InMemoryUnitCatalog,
        enrollments: &InMemoryEnrollmentStore,
    ) -> SeedSummary {
        let mut summary = SeedSummary::default();
        for course in &self.courses {
            summary.courses += 1;
            for (position, unit) in course.units.iter().enumerate() {
                catalog.upsert_unit(CatalogUnit {
                    course_id: course.id.clone(),
                    unit_id: unit.id.clone(),
                    title: unit.title.clone(),
                    position: position as u32,
                    total_duration_seconds: unit.duration_seconds,
                    minimum_watch_percentage: unit.minimum_watch_percentage,
                    is_mandatory: unit.mandatory,
                });
                summary.units += 1;
            }
        }
        for enrollment in &self.enrollments {
            enrollments.enroll(enrollment.learner_id.clone(), enrollment.course_id.clone());
            summary.enrollments += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::database::ports::{EnrollmentStore, UnitCatalog};

    const SEED: &str = r#"
        [[courses]]
        id = "rust-101"

        [[courses.units]]
        id = "intro"
        duration_seconds = 300

        [[courses.units]]
        id = "bonus"
        duration_seconds = 120
        mandatory = false

        [[enrollments]]
        learner_id = "learner-1"
        course_id = "rust-101"
    "#;

    #[tokio::test]
    async fn seed_populates_catalog_in_listed_order() {
        let seed: SeedFile = toml::from_str(SEED).unwrap();
        let catalog = InMemoryUnitCatalog::new();
        let enrollments = InMemoryEnrollmentStore::new();

        let summary = seed.apply(&catalog, &enrollments);
        assert_eq!(
            summary,
            SeedSummary {
                courses: 1,
                units: 2,
                enrollments: 1
            }
        );

        let course = CourseId::from("rust-101");
        let units = catalog.list_units(&course).await.unwrap();
        assert_eq!(units[0].unit_id.as_str(), "intro");
        assert_eq!(units[1].position, 1);
        assert!(!units[1].is_mandatory);

        let enrollment = enrollments
            .get_active_enrollment(&LearnerId::from("learner-1"), &course)
            .await
            .unwrap();
        assert!(enrollment.is_some());
    }
}
