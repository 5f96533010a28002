//! Request middleware for the Stride HTTP surface.

pub mod learner;

pub use learner::{LEARNER_ID_HEADER, require_learner};
