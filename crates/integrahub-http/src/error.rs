//! HTTP helper errors.

use integrahub_core::error::{AppError, ErrorKind};

/// Failure of an outbound HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// The request never produced a response.
    #[error("Request to {url} failed: {source}")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        /// Target URL.
        url: String,
        /// Response status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {url}: {message}")]
    Decode {
        /// Target URL.
        url: String,
        /// Decoder message.
        message: String,
    },
}

impl HttpError {
    /// The response status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<HttpError> for AppError {
    fn from(err: HttpError) -> Self {
        let message = err.to_string();
        AppError::with_source(ErrorKind::ExternalService, message, err)
    }
}
