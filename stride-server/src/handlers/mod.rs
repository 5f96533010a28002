pub mod analytics;
pub mod enrollments;
pub mod health;
pub mod progress;
