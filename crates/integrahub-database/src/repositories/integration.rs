//! Integration request repository.

use async_trait::async_trait;
use sqlx::PgPool;

use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;
use integrahub_entity::integration::{IntegrationRequest, IntegrationStatus};

use super::map_insert_error;
use crate::store::IntegrationRequestStore;

/// Repository for the `integration_requests` table.
#[derive(Debug, Clone)]
pub struct IntegrationRequestRepository {
    pool: PgPool,
}

impl IntegrationRequestRepository {
    /// Create a new integration request repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IntegrationRequestStore for IntegrationRequestRepository {
    async fn insert(&self, request: &IntegrationRequest) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO integration_requests (name, integration_type, \
             integration_request_service, reference_doctype, reference_docname, data, status, \
             error, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&request.name)
        .bind(&request.integration_type)
        .bind(&request.integration_request_service)
        .bind(&request.reference_doctype)
        .bind(&request.reference_docname)
        .bind(&request.data)
        .bind(request.status)
        .bind(&request.error)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Integration Request"))?;
        Ok(())
    }

    async fn find(&self, name: &str) -> AppResult<Option<IntegrationRequest>> {
        sqlx::query_as::<_, IntegrationRequest>(
            "SELECT * FROM integration_requests WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find integration request", e)
        })
    }

    async fn update_status(
        &self,
        name: &str,
        status: IntegrationStatus,
        error: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE integration_requests SET status = $2, error = COALESCE($3, error), \
             updated_at = NOW() WHERE name = $1",
        )
        .bind(name)
        .bind(status)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to update integration request status",
                e,
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Integration Request {name} not found"
            )));
        }
        Ok(())
    }

    async fn find_by_status(
        &self,
        service: &str,
        status: IntegrationStatus,
    ) -> AppResult<Vec<IntegrationRequest>> {
        sqlx::query_as::<_, IntegrationRequest>(
            "SELECT * FROM integration_requests \
             WHERE integration_request_service = $1 AND status = $2 \
             ORDER BY created_at ASC",
        )
        .bind(service)
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list integration requests", e)
        })
    }
}
