//! In-memory integration request log.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_entity::integration::{IntegrationRequest, IntegrationStatus};

use crate::store::IntegrationRequestStore;

/// Integration request store keyed by request name.
#[derive(Debug, Default)]
pub struct MemoryIntegrationRequestStore {
    rows: DashMap<String, IntegrationRequest>,
}

impl MemoryIntegrationRequestStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntegrationRequestStore for MemoryIntegrationRequestStore {
    async fn insert(&self, request: &IntegrationRequest) -> AppResult<()> {
        match self.rows.entry(request.name.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Integration Request already exists ({})",
                request.name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(request.clone());
                Ok(())
            }
        }
    }

    async fn find(&self, name: &str) -> AppResult<Option<IntegrationRequest>> {
        Ok(self.rows.get(name).map(|r| r.value().clone()))
    }

    async fn update_status(
        &self,
        name: &str,
        status: IntegrationStatus,
        error: Option<&str>,
    ) -> AppResult<()> {
        let mut row = self
            .rows
            .get_mut(name)
            .ok_or_else(|| AppError::not_found(format!("Integration Request {name} not found")))?;
        row.status = status;
        if let Some(error) = error {
            row.error = Some(error.to_string());
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn find_by_status(
        &self,
        service: &str,
        status: IntegrationStatus,
    ) -> AppResult<Vec<IntegrationRequest>> {
        let mut rows: Vec<IntegrationRequest> = self
            .rows
            .iter()
            .filter(|r| r.integration_request_service == service && r.status == status)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }
}
