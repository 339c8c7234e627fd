//! Convenience result type alias for IntegraHub.

use crate::error::AppError;

/// A specialized `Result` type for IntegraHub operations.
pub type AppResult<T> = Result<T, AppError>;
