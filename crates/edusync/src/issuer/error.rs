//! Issuer client error types.

use thiserror::Error;

/// Result type for issuer operations.
pub type IssuerResult<T> = Result<T, IssuerError>;

/// Errors that can occur while exchanging credentials.
#[derive(Debug, Error)]
pub enum IssuerError {
    /// HTTP client could not be built or the request failed mid-flight.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The issuer could not be reached.
    #[error("Failed to connect to credential issuer at {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// The issuer answered with a non-success status.
    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl IssuerError {
    /// HTTP status for rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            IssuerError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
