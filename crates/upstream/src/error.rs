//! Error type for the upstream HTTP clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// DNS / TCP / TLS / timeout failures.
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-2xx answer; the body is captured (truncated) for the operator.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The caller's deadline cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<UpstreamError> for datahub_core::Error {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Transport(message) => datahub_core::Error::Transport(message),
            UpstreamError::Status { status, body } => {
                datahub_core::Error::HttpStatus { status, body }
            }
            UpstreamError::Decode(message) => datahub_core::Error::Decode(message),
            UpstreamError::Cancelled => datahub_core::Error::Cancelled,
        }
    }
}
