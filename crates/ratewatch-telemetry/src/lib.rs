//! Structured logging and poll statistics for ratewatch.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Process-lifetime polling statistics, reported through the log

pub mod error;
pub mod logging;
pub mod stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use stats::{PollStats, StatsSnapshot};
