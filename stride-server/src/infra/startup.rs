use std::sync::Arc;

use anyhow::{Context, anyhow};
use stride_core::application::{ProgressService, ProgressUnitOfWorkBuilder};
use stride_core::database::PostgresDatabase;
use stride_core::database::infrastructure::memory::{
    InMemoryEnrollmentStore, InMemoryProgressRepository, InMemoryUnitCatalog,
};
use stride_core::notifications::{
    CertificateIssuer, LoggingCertificateIssuer, WebhookCertificateIssuer,
};
use tracing::{error, info};

use crate::infra::{
    app_state::AppState,
    config::{CertificateConfig, Config, StorageBackend},
    seed::SeedFile,
};

/// Connects the configured backend and wires the engine into [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let certificates = certificate_issuer(&config.certificates)?;
    let builder = ProgressUnitOfWorkBuilder::new().with_certificates(certificates);

    let (builder, postgres) = match config.storage.backend {
        StorageBackend::Memory => (memory_backend(builder, &config)?, None),
        StorageBackend::Postgres => {
            let db = connect_postgres(&config).await?;
            (builder.with_postgres(&db), Some(Arc::new(db)))
        }
    };

    let uow = builder
        .build()
        .map_err(|err| anyhow!("failed to build unit of work: {err}"))?;
    let service =
        ProgressService::new(uow, config.engine.clone(), config.analytics.clone());

    Ok(AppState::new(
        service,
        Arc::clone(&config),
        config.storage.backend,
        postgres,
    ))
}

fn memory_backend(
    builder: ProgressUnitOfWorkBuilder,
    config: &Config,
) -> anyhow::Result<ProgressUnitOfWorkBuilder> {
    let catalog = InMemoryUnitCatalog::new();
    let enrollments = InMemoryEnrollmentStore::new();

    if let Some(path) = &config.storage.seed_path {
        let summary = SeedFile::load(path)?.apply(&catalog, &enrollments);
        info!(
            path = %path.display(),
            courses = summary.courses,
            units = summary.units,
            enrollments = summary.enrollments,
            "memory backend seeded"
        );
    }

    Ok(builder.with_memory(InMemoryProgressRepository::new(), enrollments, catalog))
}

/// Connects and applies pending migrations
pub async fn connect_postgres(config: &Config) -> anyhow::Result<PostgresDatabase> {
    let url = config.storage.database_url.as_deref().ok_or_else(|| {
        anyhow!("postgres backend requires storage.database_url or DATABASE_URL")
    })?;

    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        error!("Only PostgreSQL database URLs are supported");
        return Err(anyhow!(
            "Invalid database URL: must start with postgres:// or postgresql://"
        ));
    }

    let db = PostgresDatabase::connect(url, config.storage.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(
        max_connections = config.storage.max_connections,
        "Successfully connected to PostgreSQL"
    );

    db.initialize_schema()
        .await
        .context("database migration failed")?;
    info!("Database schema initialized successfully");

    Ok(db)
}

fn certificate_issuer(
    config: &CertificateConfig,
) -> anyhow::Result<Arc<dyn CertificateIssuer>> {
    match &config.webhook_url {
        Some(url) => {
            let issuer = WebhookCertificateIssuer::new(url.clone(), config.timeout)
                .context("failed to build certificate webhook client")?;
            info!(endpoint = %issuer.endpoint(), "certificate webhook enabled");
            Ok(Arc::new(issuer))
        }
        None => Ok(Arc::new(LoggingCertificateIssuer)),
    }
}
