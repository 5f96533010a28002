//! DashMap-backed adapters with the same conditional-write semantics as the
//! Postgres ones. They back the test suites and the `memory` storage backend.

pub mod catalog;
pub mod enrollments;
pub mod progress;

pub use catalog::InMemoryUnitCatalog;
pub use enrollments::InMemoryEnrollmentStore;
pub use progress::InMemoryProgressRepository;
