//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] ratewatch_core::CoreError),

    #[error("Feed error: {0}")]
    Feed(#[from] ratewatch_feed::FeedError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] ratewatch_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
