use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row, postgres::PgRow};
use stride_model::{
    CourseId, EngagementSignals, LearnerId, ProgressKey, ProgressRecord,
    ProgressStatus,
};

use crate::database::ports::progress::{ProgressRepository, WriteOutcome};
use crate::error::{ProgressError, Result};

#[derive(Debug, Clone)]
pub struct PostgresProgressRepository {
    pool: PgPool,
}

impl PostgresProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<ProgressRecord> {
        let status: String = row.try_get("status")?;
        let status = status.parse::<ProgressStatus>()?;
        let Json(engagement_signals): Json<EngagementSignals> =
            row.try_get("engagement_signals")?;
        let version: i64 = row.try_get("version")?;

        Ok(ProgressRecord {
            learner_id: LearnerId::from(row.try_get::<String, _>("learner_id")?),
            course_id: CourseId::from(row.try_get::<String, _>("course_id")?),
            unit_id: row.try_get::<String, _>("unit_id")?.into(),
            watch_time_seconds: row.try_get("watch_time_seconds")?,
            total_duration_seconds: row.try_get("total_duration_seconds")?,
            completion_percentage: row.try_get("completion_percentage")?,
            status,
            resume_position_seconds: row.try_get("resume_position_seconds")?,
            first_seen_at: row.try_get("first_seen_at")?,
            last_seen_at: row.try_get("last_seen_at")?,
            completed_at: row.try_get("completed_at")?,
            engagement_signals,
            archived_at: row.try_get("archived_at")?,
            version: Self::stored_version(version)?,
        })
    }

    fn stored_version(version: i64) -> Result<u64> {
        u64::try_from(version).map_err(|_| {
            ProgressError::Internal(format!("negative progress version {version}"))
        })
    }

    fn version_param(version: u64) -> Result<i64> {
        i64::try_from(version).map_err(|_| {
            ProgressError::Internal(format!("progress version {version} out of range"))
        })
    }
}

#[async_trait]
impl ProgressRepository for PostgresProgressRepository {
    async fn get(&self, key: &ProgressKey) -> Result<Option<ProgressRecord>> {
        let row = sqlx::query(
            r#"
            SELECT learner_id, unit_id, course_id, watch_time_seconds,
                   total_duration_seconds, completion_percentage, status,
                   resume_position_seconds, first_seen_at, last_seen_at,
                   completed_at, engagement_signals, archived_at, version
            FROM progress_records
            WHERE learner_id = $1 AND unit_id = $2
            "#,
        )
        .bind(key.learner_id.as_str())
        .bind(key.unit_id.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn compare_and_swap(
        &self,
        record: &ProgressRecord,
        expected: Option<u64>,
    ) -> Result<WriteOutcome> {
        let new_version: Option<i64> = match expected {
            None => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO progress_records (
                        learner_id, unit_id, course_id, watch_time_seconds,
                        total_duration_seconds, completion_percentage, status,
                        resume_position_seconds, first_seen_at, last_seen_at,
                        completed_at, engagement_signals, archived_at, version
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 1)
                    ON CONFLICT (learner_id, unit_id) DO NOTHING
                    RETURNING version
                    "#,
                )
                .bind(record.learner_id.as_str())
                .bind(record.unit_id.as_str())
                .bind(record.course_id.as_str())
                .bind(record.watch_time_seconds)
                .bind(record.total_duration_seconds)
                .bind(record.completion_percentage)
                .bind(record.status.as_str())
                .bind(record.resume_position_seconds)
                .bind(record.first_seen_at)
                .bind(record.last_seen_at)
                .bind(record.completed_at)
                .bind(Json(&record.engagement_signals))
                .bind(record.archived_at)
                .fetch_optional(self.pool())
                .await?
            }
            Some(expected) => {
                sqlx::query_scalar(
                    r#"
                    UPDATE progress_records SET
                        course_id = $3,
                        watch_time_seconds = $4,
                        total_duration_seconds = $5,
                        completion_percentage = $6,
                        status = $7,
                        resume_position_seconds = $8,
                        first_seen_at = $9,
                        last_seen_at = $10,
                        completed_at = $11,
                        engagement_signals = $12,
                        archived_at = $13,
                        version = version + 1
                    WHERE learner_id = $1 AND unit_id = $2 AND version = $14
                    RETURNING version
                    "#,
                )
                .bind(record.learner_id.as_str())
                .bind(record.unit_id.as_str())
                .bind(record.course_id.as_str())
                .bind(record.watch_time_seconds)
                .bind(record.total_duration_seconds)
                .bind(record.completion_percentage)
                .bind(record.status.as_str())
                .bind(record.resume_position_seconds)
                .bind(record.first_seen_at)
                .bind(record.last_seen_at)
                .bind(record.completed_at)
                .bind(Json(&record.engagement_signals))
                .bind(record.archived_at)
                .bind(Self::version_param(expected)?)
                .fetch_optional(self.pool())
                .await?
            }
        };

        Ok(match new_version {
            Some(version) => {
                let mut stored = record.clone();
                stored.version = Self::stored_version(version)?;
                WriteOutcome::Written(stored)
            }
            None => WriteOutcome::VersionMismatch,
        })
    }

    async fn list_for_learner(
        &self,
        learner_id: &LearnerId,
        course_id: Option<&CourseId>,
    ) -> Result<Vec<ProgressRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT learner_id, unit_id, course_id, watch_time_seconds,
                   total_duration_seconds, completion_percentage, status,
                   resume_position_seconds, first_seen_at, last_seen_at,
                   completed_at, engagement_signals, archived_at, version
            FROM progress_records
            WHERE learner_id = $1
              AND ($2::TEXT IS NULL OR course_id = $2)
            ORDER BY unit_id
            "#,
        )
        .bind(learner_id.as_str())
        .bind(course_id.map(CourseId::as_str))
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn archive_course(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
        archived_at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE progress_records
            SET archived_at = $3, version = version + 1
            WHERE learner_id = $1 AND course_id = $2 AND archived_at IS NULL
            "#,
        )
        .bind(learner_id.as_str())
        .bind(course_id.as_str())
        .bind(archived_at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_versions_are_internal_errors() {
        assert_eq!(PostgresProgressRepository::stored_version(7).unwrap(), 7);
        assert!(matches!(
            PostgresProgressRepository::stored_version(-1),
            Err(ProgressError::Internal(_))
        ));
    }
}
