//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod repositories;

pub use repositories::catalog::PostgresUnitCatalog;
pub use repositories::enrollments::PostgresEnrollmentStore;
pub use repositories::progress::PostgresProgressRepository;
