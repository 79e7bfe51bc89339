//! Conditional Orders Bounded Context
//!
//! A trigger pairs a target price with a standing share quantity. When the
//! market crosses the target, the standing quantity is bought or sold once
//! and the trigger retires.

pub mod state;
pub mod trigger;

pub use state::TriggerState;
pub use trigger::{Trigger, TriggerKey};
