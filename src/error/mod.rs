//! Error handling
//!
//! Defines error types and handling for the feeder.

pub mod handlers;
pub mod types;

pub use types::*;
