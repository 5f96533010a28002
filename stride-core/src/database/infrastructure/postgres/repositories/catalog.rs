use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use stride_model::{CatalogUnit, CourseId, UnitId};

use crate::database::ports::catalog::UnitCatalog;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct PostgresUnitCatalog {
    pool: PgPool,
}

impl PostgresUnitCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<CatalogUnit> {
        let position: i32 = row.try_get("position")?;
        Ok(CatalogUnit {
            course_id: CourseId::from(row.try_get::<String, _>("course_id")?),
            unit_id: UnitId::from(row.try_get::<String, _>("unit_id")?),
            title: row.try_get("title")?,
            position: position.max(0) as u32,
            total_duration_seconds: row.try_get("total_duration_seconds")?,
            minimum_watch_percentage: row.try_get("minimum_watch_percentage")?,
            is_mandatory: row.try_get("is_mandatory")?,
        })
    }

    /// Used by seeding and tests; the engine itself never writes the catalog
    pub async fn upsert_unit(&self, unit: &CatalogUnit) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO course_units (
                course_id, unit_id, title, position, total_duration_seconds,
                minimum_watch_percentage, is_mandatory
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (course_id, unit_id) DO UPDATE SET
                title = EXCLUDED.title,
                position = EXCLUDED.position,
                total_duration_seconds = EXCLUDED.total_duration_seconds,
                minimum_watch_percentage = EXCLUDED.minimum_watch_percentage,
                is_mandatory = EXCLUDED.is_mandatory
            "#,
        )
        .bind(unit.course_id.as_str())
        .bind(unit.unit_id.as_str())
        .bind(unit.title.as_deref())
        .bind(i32::try_from(unit.position).unwrap_or(i32::MAX))
        .bind(unit.total_duration_seconds)
        .bind(unit.minimum_watch_percentage)
        .bind(unit.is_mandatory)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UnitCatalog for PostgresUnitCatalog {
    async fn get_unit(
        &self,
        course_id: &CourseId,
        unit_id: &UnitId,
    ) -> Result<Option<CatalogUnit>> {
        let row = sqlx::query(
            r#"
            SELECT course_id, unit_id, title, position, total_duration_seconds,
                   minimum_watch_percentage, is_mandatory
            FROM course_units
            WHERE course_id = $1 AND unit_id = $2
            "#,
        )
        .bind(course_id.as_str())
        .bind(unit_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_units(&self, course_id: &CourseId) -> Result<Vec<CatalogUnit>> {
        let rows = sqlx::query(
            r#"
            SELECT course_id, unit_id, title, position, total_duration_seconds,
                   minimum_watch_percentage, is_mandatory
            FROM course_units
            WHERE course_id = $1
            ORDER BY position, unit_id
            "#,
        )
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn list_mandatory_units(&self, course_id: &CourseId) -> Result<Vec<UnitId>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT unit_id FROM course_units
            WHERE course_id = $1 AND is_mandatory
            ORDER BY position, unit_id
            "#,
        )
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(UnitId::from).collect())
    }
}
