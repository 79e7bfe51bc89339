//! Domain Layer
//!
//! Core business logic with no infrastructure dependencies.
//!
//! # Bounded Contexts
//!
//! - `order_staging`: two-phase buy/sell reservations and their LIFO stacks
//! - `conditional_orders`: price triggers and their lifecycle
//! - `shared`: value objects used by both

pub mod conditional_orders;
pub mod order_staging;
pub mod shared;
