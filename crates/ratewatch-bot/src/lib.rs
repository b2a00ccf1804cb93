//! Ticker aggregation bot.
//!
//! Wires the configured data feeds, value providers and aggregator together
//! and runs them until shutdown:
//! - TOML configuration of feeds, providers and extractors
//! - Console output of debounced aggregation snapshots
//! - Periodic poll statistics through the log

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
