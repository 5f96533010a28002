//! # Stride Core
//!
//! Progress and completion engine for Stride: turns noisy watch samples from
//! many concurrent learners into durable, monotonic completion state and
//! derives engagement analytics from it.
//!
//! ## Overview
//!
//! - **Completion state machine** ([`domain::progress`]): pure merge of one
//!   watch sample into a per-unit progress record
//! - **Enrollment aggregation** ([`domain::enrollment`]): course completion
//!   percentage from mandatory unit states
//! - **Analytics** ([`domain::analytics`]): daily buckets, streaks,
//!   engagement score and heuristic recommendations
//! - **Ports and adapters** ([`database`]): repository traits with in-memory
//!   and PostgreSQL implementations
//! - **Application services** ([`application`]): ingestion with optimistic
//!   concurrency, aggregation and the analytics read path
//!
//! ## Feature Flags
//!
//! - `database`: PostgreSQL adapters and embedded migrations (SQLx)
//!
//! ## Examples
//!
//! ```no_run
//! use stride_core::application::{ProgressService, ProgressUnitOfWorkBuilder};
//! use stride_core::database::infrastructure::memory::{
//!     InMemoryEnrollmentStore, InMemoryProgressRepository, InMemoryUnitCatalog,
//! };
//! use stride_core::settings::{AnalyticsSettings, EngineSettings};
//! use stride_model::WatchSample;
//!
//! async fn track() -> Result<(), Box<dyn std::error::Error>> {
//!     let enrollments = InMemoryEnrollmentStore::new();
//!     enrollments.enroll("learner-1".into(), "rust-101".into());
//!
//!     let uow = ProgressUnitOfWorkBuilder::new()
//!         .with_memory(
//!             InMemoryProgressRepository::new(),
//!             enrollments,
//!             InMemoryUnitCatalog::new(),
//!         )
//!         .build()?;
//!     let service =
//!         ProgressService::new(uow, EngineSettings::default(), AnalyticsSettings::default());
//!
//!     let sample = WatchSample::at(450.0, 500.0, chrono::Utc::now());
//!     let record = service
//!         .record_progress(&"rust-101".into(), &"u1".into(), &"learner-1".into(), &sample)
//!         .await?;
//!     println!("{} is {}", record.unit_id, record.status);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Application services and the unit of work wiring the ports
pub mod application;

/// Repository ports and their adapters
pub mod database;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Pure domain logic
pub mod domain;

/// Error types and error handling utilities
pub mod error;

/// Course-completion notifications
pub mod notifications;

/// Engine and analytics tunables
pub mod settings;

pub use error::{ProgressError, Result};
pub use stride_model;
