pub mod infrastructure;
pub mod ports;
#[cfg(feature = "database")]
pub mod postgres;

pub use ports::{EnrollmentStore, ProgressRepository, UnitCatalog, WriteOutcome};
#[cfg(feature = "database")]
pub use postgres::{PoolStats, PostgresDatabase};
