use async_trait::async_trait;
use stride_model::{CatalogUnit, CourseId, UnitId};

use crate::error::Result;

/// Read-only view of the course catalog, owned elsewhere
#[async_trait]
pub trait UnitCatalog: Send + Sync {
    async fn get_unit(
        &self,
        course_id: &CourseId,
        unit_id: &UnitId,
    ) -> Result<Option<CatalogUnit>>;

    /// Units of a course in catalog order
    async fn list_units(&self, course_id: &CourseId) -> Result<Vec<CatalogUnit>>;

    async fn list_mandatory_units(&self, course_id: &CourseId) -> Result<Vec<UnitId>> {
        Ok(self
            .list_units(course_id)
            .await?
            .into_iter()
            .filter(|unit| unit.is_mandatory)
            .map(|unit| unit.unit_id)
            .collect())
    }
}
