//! Cloud client error types

use thiserror::Error;

/// Cloud client errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("API token rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited by the API")]
    RateLimited,

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl CloudError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CloudError::RateLimited | CloudError::Transport(_) => true,
            CloudError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
