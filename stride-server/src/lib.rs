//! # Stride Server
//!
//! HTTP surface for the Stride progress tracking and completion analytics
//! engine: ingest playback samples, read enrollment progress and serve
//! engagement reports.
#![allow(missing_docs)]

pub mod app;
pub mod errors;
pub mod handlers;
pub mod infra;
pub mod middleware;
pub mod routes;

pub use app::create_app;
pub use infra::app_state::AppState;
