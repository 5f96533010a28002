use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;

use crate::database::infrastructure::memory::{
    InMemoryEnrollmentStore, InMemoryProgressRepository, InMemoryUnitCatalog,
};
use crate::database::ports::{EnrollmentStore, ProgressRepository, UnitCatalog};
#[cfg(feature = "database")]
use crate::database::postgres::PostgresDatabase;
use crate::notifications::{CertificateIssuer, LoggingCertificateIssuer};

/// Aggregates the ports used by the application services.
#[derive(Clone)]
pub struct ProgressUnitOfWork {
    pub progress: Arc<dyn ProgressRepository>,
    pub enrollments: Arc<dyn EnrollmentStore>,
    pub catalog: Arc<dyn UnitCatalog>,
    pub certificates: Arc<dyn CertificateIssuer>,
}

impl fmt::Debug for ProgressUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressUnitOfWork")
            .field("progress", &type_name_of_val(self.progress.as_ref()))
            .field("enrollments", &type_name_of_val(self.enrollments.as_ref()))
            .field("catalog", &type_name_of_val(self.catalog.as_ref()))
            .field("certificates", &type_name_of_val(self.certificates.as_ref()))
            .finish()
    }
}

#[derive(Default)]
pub struct ProgressUnitOfWorkBuilder {
    progress: Option<Arc<dyn ProgressRepository>>,
    enrollments: Option<Arc<dyn EnrollmentStore>>,
    catalog: Option<Arc<dyn UnitCatalog>>,
    certificates: Option<Arc<dyn CertificateIssuer>>,
}

impl fmt::Debug for ProgressUnitOfWorkBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressUnitOfWorkBuilder")
            .field("progress", &self.progress.is_some())
            .field("enrollments", &self.enrollments.is_some())
            .field("catalog", &self.catalog.is_some())
            .field("certificates", &self.certificates.is_some())
            .finish()
    }
}

impl ProgressUnitOfWorkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, repo: Arc<dyn ProgressRepository>) -> Self {
        self.progress = Some(repo);
        self
    }

    pub fn with_enrollments(mut self, store: Arc<dyn EnrollmentStore>) -> Self {
        self.enrollments = Some(store);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn UnitCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_certificates(mut self, issuer: Arc<dyn CertificateIssuer>) -> Self {
        self.certificates = Some(issuer);
        self
    }

    /// Populate every port with the in-memory adapters passed in
    pub fn with_memory(
        self,
        progress: InMemoryProgressRepository,
        enrollments: InMemoryEnrollmentStore,
        catalog: InMemoryUnitCatalog,
    ) -> Self {
        self.with_progress(Arc::new(progress))
            .with_enrollments(Arc::new(enrollments))
            .with_catalog(Arc::new(catalog))
    }

    /// Build a validated unit of work. Without an explicit certificate
    /// issuer completions are only logged.
    pub fn build(self) -> Result<ProgressUnitOfWork, String> {
        Ok(ProgressUnitOfWork {
            progress: self
                .progress
                .ok_or_else(|| "missing ProgressRepository".to_string())?,
            enrollments: self
                .enrollments
                .ok_or_else(|| "missing EnrollmentStore".to_string())?,
            catalog: self
                .catalog
                .ok_or_else(|| "missing UnitCatalog".to_string())?,
            certificates: self
                .certificates
                .unwrap_or_else(|| Arc::new(LoggingCertificateIssuer)),
        })
    }
}

#[cfg(feature = "database")]
impl ProgressUnitOfWorkBuilder {
    /// Populate the builder with Postgres-backed repository adapters.
    pub fn with_postgres(self, db: &PostgresDatabase) -> Self {
        self.with_progress(Arc::new(db.progress_repository().clone()))
            .with_enrollments(Arc::new(db.enrollment_store().clone()))
            .with_catalog(Arc::new(db.unit_catalog().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_reports_missing_ports() {
        let err = ProgressUnitOfWorkBuilder::new()
            .with_progress(Arc::new(InMemoryProgressRepository::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, "missing EnrollmentStore");
    }

    #[tokio::test]
    async fn certificates_default_to_logging() {
        let uow = ProgressUnitOfWorkBuilder::new()
            .with_memory(
                InMemoryProgressRepository::new(),
                InMemoryEnrollmentStore::new(),
                InMemoryUnitCatalog::new(),
            )
            .build()
            .unwrap();
        uow.certificates
            .on_course_completed(&"l1".into(), &"c1".into(), chrono::Utc::now())
            .await
            .unwrap();
    }
}
