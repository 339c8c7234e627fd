//! Database migration runner.

use tracing::info;

use integrahub_core::error::{AppError, ErrorKind};

use crate::connection::DatabasePool;

/// Apply every pending migration under `migrations/`.
pub async fn run_migrations(db: &DatabasePool) -> Result<(), AppError> {
    info!("Running database migrations");

    sqlx::migrate!("../../migrations")
        .run(db.pool())
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations applied");
    Ok(())
}
