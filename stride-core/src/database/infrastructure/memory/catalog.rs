use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use stride_model::{CatalogUnit, CourseId, UnitId};

use crate::database::ports::catalog::UnitCatalog;
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct InMemoryUnitCatalog {
    courses: Arc<DashMap<CourseId, Vec<CatalogUnit>>>,
}

impl InMemoryUnitCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a unit, keeping the course in catalog order
    pub fn upsert_unit(&self, unit: CatalogUnit) {
        let mut units = self.courses.entry(unit.course_id.clone()).or_default();
        units.retain(|existing| existing.unit_id != unit.unit_id);
        units.push(unit);
        units.sort_by_key(|unit| unit.position);
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }
}

#[async_trait]
impl UnitCatalog for InMemoryUnitCatalog {
    async fn get_unit(
        &self,
        course_id: &CourseId,
        unit_id: &UnitId,
    ) -> Result<Option<CatalogUnit>> {
        Ok(self.courses.get(course_id).and_then(|units| {
            units.iter().find(|unit| &unit.unit_id == unit_id).cloned()
        }))
    }

    async fn list_units(&self, course_id: &CourseId) -> Result<Vec<CatalogUnit>> {
        Ok(self
            .courses
            .get(course_id)
            .map(|units| units.value().clone())
            .unwrap_or_default())
    }
}
