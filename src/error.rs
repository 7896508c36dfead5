use std::path::PathBuf;

use thiserror::Error;

/// Stage-fatal conditions. Everything else in the pipeline is fail-soft:
/// per-record failures land in the failure log or the rejects list and the
/// batch keeps going.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required input {path:?} is missing or empty")]
    EmptyInput { path: PathBuf },

    #[error("SPIDER_API_KEY environment variable is not set")]
    MissingApiKey,
}

/// Errors surfaced by the maps automation collaborator.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("place not found")]
    NotFound,

    #[error("navigation timed out")]
    Timeout,

    #[error("rate limited by the service")]
    RateLimited,

    #[error("request blocked")]
    Blocked,

    #[error("http status {0}")]
    Http(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed page content: {0}")]
    Malformed(String),
}

impl DriverError {
    /// Worth retrying with backoff: rate limits, timeouts, server errors.
    /// Not-found and blocked requests are terminal for the record.
    pub fn is_transient(&self) -> bool {
        match self {
            DriverError::Timeout | DriverError::RateLimited => true,
            DriverError::Http(status) => *status >= 500,
            DriverError::Network(_) => true,
            _ => false,
        }
    }
}
