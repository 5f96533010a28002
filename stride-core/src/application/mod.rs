//! Application services orchestrating the pure domain over the ports.

pub mod aggregator;
pub mod analytics;
pub mod ingest;
pub mod service;
pub mod unit_of_work;

pub use aggregator::EnrollmentAggregator;
pub use analytics::AnalyticsService;
pub use ingest::EventIngestor;
pub use service::ProgressService;
pub use unit_of_work::{ProgressUnitOfWork, ProgressUnitOfWorkBuilder};
