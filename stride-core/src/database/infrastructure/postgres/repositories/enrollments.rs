use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use stride_model::{
    CourseId, Enrollment, EnrollmentId, EnrollmentStatus, LearnerId, UnitId,
};
use uuid::Uuid;

use crate::database::ports::enrollments::EnrollmentStore;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Enrollment> {
        let id: Uuid = row.try_get("id")?;
        let status: String = row.try_get("status")?;
        let overall_percentage: i16 = row.try_get("overall_percentage")?;
        let completed_unit_ids: Vec<String> = row.try_get("completed_unit_ids")?;
        let completion_date: Option<DateTime<Utc>> = row.try_get("completion_date")?;

        Ok(Enrollment {
            id: EnrollmentId(id),
            learner_id: LearnerId::from(row.try_get::<String, _>("learner_id")?),
            course_id: CourseId::from(row.try_get::<String, _>("course_id")?),
            overall_percentage: overall_percentage.clamp(0, 100) as u8,
            status: status.parse::<EnrollmentStatus>()?,
            completed_unit_ids: completed_unit_ids.into_iter().map(UnitId::from).collect(),
            completion_date,
            enrolled_at: row.try_get("enrolled_at")?,
        })
    }
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn get_enrollment(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>> {
        let row = sqlx::query(
            r#"
            SELECT id, learner_id, course_id, overall_percentage, status,
                   completed_unit_ids, completion_date, enrolled_at
            FROM enrollments
            WHERE learner_id = $1 AND course_id = $2
            "#,
        )
        .bind(learner_id.as_str())
        .bind(course_id.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn get_by_id(&self, id: &EnrollmentId) -> Result<Option<Enrollment>> {
        let row = sqlx::query(
            r#"
            SELECT id, learner_id, course_id, overall_percentage, status,
                   completed_unit_ids, completion_date, enrolled_at
            FROM enrollments
            WHERE id = $1
            "#,
        )
        .bind(id.to_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn compare_and_swap(&self, expected: &Enrollment, next: &Enrollment) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE enrollments SET
                overall_percentage = $2,
                status = $3,
                completed_unit_ids = $4,
                completion_date = $5
            WHERE id = $1
              AND overall_percentage = $6
              AND status = $7
              AND completed_unit_ids = $8
              AND completion_date IS NOT DISTINCT FROM $9
            "#,
        )
        .bind(expected.id.to_uuid())
        .bind(i16::from(next.overall_percentage))
        .bind(next.status.as_str())
        .bind(unit_list(&next.completed_unit_ids))
        .bind(next.completion_date)
        .bind(i16::from(expected.overall_percentage))
        .bind(expected.status.as_str())
        .bind(unit_list(&expected.completed_unit_ids))
        .bind(expected.completion_date)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn unit_list(units: &BTreeSet<UnitId>) -> Vec<&str> {
    units.iter().map(UnitId::as_str).collect()
}
