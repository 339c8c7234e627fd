//! Cloud storage errors.

use integrahub_core::error::{AppError, ErrorKind};
use integrahub_http::HttpError;

/// Failure reported by a cloud storage provider.
///
/// Token expiry is distinguished from every other failure so the uploader
/// can renew its session and retry.
#[derive(Debug, thiserror::Error)]
pub enum CloudStorageError {
    /// The remote path does not exist.
    #[error("Remote path not found: {0}")]
    NotFound(String),

    /// The access token expired; a renewed session may succeed.
    #[error("Access token expired: {0}")]
    ExpiredToken(String),

    /// The access token is not valid; renewing will not help.
    #[error("Access token not found or invalid: {0}")]
    InvalidToken(String),

    /// The provider rejected the call.
    #[error("Cloud storage API returned HTTP {status}: {summary}")]
    Api {
        /// Response status.
        status: u16,
        /// Provider error summary.
        summary: String,
    },

    /// The call never reached the provider or its answer was unreadable.
    #[error(transparent)]
    Transport(#[from] HttpError),
}

impl CloudStorageError {
    /// Whether a session renewal may clear this error.
    pub fn is_expired_token(&self) -> bool {
        matches!(self, Self::ExpiredToken(_))
    }

    /// Whether the remote path was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<CloudStorageError> for AppError {
    fn from(err: CloudStorageError) -> Self {
        let kind = match &err {
            CloudStorageError::NotFound(_) => ErrorKind::NotFound,
            CloudStorageError::ExpiredToken(_) | CloudStorageError::InvalidToken(_) => {
                ErrorKind::Authentication
            }
            CloudStorageError::Api { .. } | CloudStorageError::Transport(_) => {
                ErrorKind::ExternalService
            }
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
