//! Operator endpoints.

pub mod handlers;

pub use handlers::clear_throttle;
