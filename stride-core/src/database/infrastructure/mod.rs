//! Port implementations.

pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;
