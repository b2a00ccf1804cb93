//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Data feed ({0}) is already running")]
    AlreadyRunning(String),

    #[error("Data feed ({0}) is not running and cannot be stopped")]
    NotRunning(String),

    #[error("Listener is already registered")]
    DuplicateListener,

    #[error("Data feed ({0}) has a zero update interval")]
    InvalidInterval(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

pub type FeedResult<T> = Result<T, FeedError>;
