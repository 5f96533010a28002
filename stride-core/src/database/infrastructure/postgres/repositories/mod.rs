//! PostgreSQL-backed repository implementations.

pub mod catalog;
pub mod enrollments;
pub mod progress;
