//! Core domain types for the ratewatch ticker aggregator.
//!
//! This crate provides the types shared across the pipeline:
//! - `Quantity`: the closed set of logical measured values
//! - `CoreError`: configuration-level errors

pub mod error;
pub mod quantity;

pub use error::{CoreError, Result};
pub use quantity::Quantity;
