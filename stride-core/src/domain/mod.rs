//! Pure domain logic: no I/O, no clocks except where passed in.

pub mod analytics;
pub mod enrollment;
pub mod progress;
