//! Error taxonomy shared across the data hub.

use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed environment input. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-level failure talking to the upstream (DNS, TCP, TLS, timeout).
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-2xx status. The body is captured
    /// verbatim so the operator can see what the provider complained about.
    #[error("upstream returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The upstream body could not be decoded as the expected shape.
    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    /// Warehouse failure. The surrounding transaction has been rolled back.
    #[error("database error: {0}")]
    Db(String),

    /// The job deadline elapsed or the caller cancelled. Watermarks are
    /// never advanced on this path.
    #[error("operation cancelled")]
    Cancelled,

    /// A logical inconsistency that indicates a bug, not bad input.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// HTTP status if this is an upstream status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for errors that abort a job without indicating a bug or bad
    /// input: the next scheduled run may simply succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Cancelled => true,
            Self::HttpStatus { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Config(_) | Self::Decode(_) | Self::Db(_) | Self::Invariant(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_for_http_errors() {
        let err = Error::HttpStatus {
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(Error::Cancelled.status_code(), None);
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = Error::HttpStatus {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_retryable());
        let err = Error::HttpStatus {
            status: 400,
            body: String::new(),
        };
        assert!(!err.is_retryable());
        assert!(!Error::Invariant("loop".into()).is_retryable());
    }
}
