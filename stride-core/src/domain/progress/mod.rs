//! Per-unit progress domain logic.

pub mod state_machine;

pub use state_machine::{
    Applied, UnitIdentity, apply, completion_percentage, validate_sample,
};
