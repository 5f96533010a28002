use std::fmt;
use std::time::Duration;

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

use crate::database::infrastructure::postgres::{
    PostgresEnrollmentStore, PostgresProgressRepository, PostgresUnitCatalog,
};
use crate::error::{ProgressError, Result};

/// Statistics about the connection pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
}

/// Connection pool plus the repositories built on it
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    max_connections: u32,
    progress: PostgresProgressRepository,
    enrollments: PostgresEnrollmentStore,
    catalog: PostgresUnitCatalog,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(connection_string: &str, max_connections: u32) -> Result<Self> {
        let options = connection_string
            .trim()
            .parse::<PgConnectOptions>()
            .map_err(|e| {
                ProgressError::Internal(format!(
                    "Invalid PostgreSQL connection string: {e}"
                ))
            })?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect_with(options)
            .await
            .map_err(|e| {
                ProgressError::Internal(format!("Database connection failed: {e}"))
            })?;

        info!(max_connections, "Database pool initialized");

        Ok(Self::with_max_connections(pool, max_connections))
    }

    /// Wraps an existing pool (mainly for testing)
    pub fn from_pool(pool: PgPool) -> Self {
        Self::with_max_connections(pool, 20)
    }

    fn with_max_connections(pool: PgPool, max_connections: u32) -> Self {
        Self {
            progress: PostgresProgressRepository::new(pool.clone()),
            enrollments: PostgresEnrollmentStore::new(pool.clone()),
            catalog: PostgresUnitCatalog::new(pool.clone()),
            pool,
            max_connections,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn progress_repository(&self) -> &PostgresProgressRepository {
        &self.progress
    }

    pub fn enrollment_store(&self) -> &PostgresEnrollmentStore {
        &self.enrollments
    }

    pub fn unit_catalog(&self) -> &PostgresUnitCatalog {
        &self.catalog
    }

    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.max_connections,
        }
    }

    /// Apply the embedded migrations
    pub async fn initialize_schema(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|e| {
            ProgressError::Internal(format!("Migration failed: {e}"))
        })?;
        info!("Database schema is up to date");
        Ok(())
    }
}
