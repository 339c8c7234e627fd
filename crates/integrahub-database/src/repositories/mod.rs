//! PostgreSQL implementations of the store traits.

pub mod file;
pub mod integration;
pub mod job;
pub mod settings;
pub mod webhook;

pub use file::FileRepository;
pub use integration::IntegrationRequestRepository;
pub use job::JobRepository;
pub use settings::SettingsRepository;
pub use webhook::WebhookRepository;

use integrahub_core::error::{AppError, ErrorKind};

/// Maps an insert failure, turning uniqueness violations into `Conflict`.
pub(crate) fn map_insert_error(e: sqlx::Error, what: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::conflict(format!(
                "{what} already exists ({})",
                db_err.constraint().unwrap_or("primary key")
            ))
        }
        other => AppError::with_source(
            ErrorKind::Database,
            format!("Failed to insert {what}"),
            other,
        ),
    }
}
