//! PostgreSQL connection pool management.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use integrahub_core::config::DatabaseConfig;
use integrahub_core::error::{AppError, ErrorKind};

use crate::repositories::{
    FileRepository, IntegrationRequestRepository, JobRepository, SettingsRepository,
    WebhookRepository,
};
use crate::store::Stores;

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Create a new database pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Repository-backed stores sharing this pool.
    pub fn stores(&self) -> Stores {
        Stores {
            files: Arc::new(FileRepository::new(self.pool.clone())),
            integration_requests: Arc::new(IntegrationRequestRepository::new(self.pool.clone())),
            webhooks: Arc::new(WebhookRepository::new(self.pool.clone())),
            settings: Arc::new(SettingsRepository::new(self.pool.clone())),
            jobs: Arc::new(JobRepository::new(self.pool.clone())),
        }
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Mask the password portion of a database URL for safe logging.
fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    match url.rfind('@') {
        Some(at_pos) if at_pos > scheme_end => match url[scheme_end..at_pos].find(':') {
            Some(rel) => format!("{}:****{}", &url[..scheme_end + rel], &url[at_pos..]),
            None => url.to_string(),
        },
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://integrahub:s3cr@t@db:5432/integrahub"),
            "postgres://integrahub:****@db:5432/integrahub"
        );
        assert_eq!(
            mask_password("postgres://localhost:5432/integrahub"),
            "postgres://localhost:5432/integrahub"
        );
        assert_eq!(
            mask_password("postgres://reader@db/integrahub"),
            "postgres://reader@db/integrahub"
        );
    }
}
