//! Repository ports (interfaces) the application services depend on.
//!
//! Implementations live under `database::infrastructure`: an in-memory
//! adapter for tests and single-node use, and a Postgres adapter.

pub mod catalog;
pub mod enrollments;
pub mod progress;

pub use catalog::UnitCatalog;
pub use enrollments::EnrollmentStore;
pub use progress::{ProgressRepository, WriteOutcome};
