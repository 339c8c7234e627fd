//! Integration request records and their status transitions.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::types::DocRef;
use integrahub_database::IntegrationRequestStore;
use integrahub_entity::integration::{
    IntegrationRequest, IntegrationStatus, NewIntegrationRequest,
};

/// Creates and advances integration request records.
///
/// Records are never deleted; the store offers no way to.
#[derive(Debug, Clone)]
pub struct IntegrationLog {
    store: Arc<dyn IntegrationRequestStore>,
}

impl IntegrationLog {
    /// Creates the log over a store.
    pub fn new(store: Arc<dyn IntegrationRequestStore>) -> Self {
        Self { store }
    }

    /// Records a new request in `Queued` state.
    ///
    /// `data` may be a JSON object or a string holding one. Its
    /// `reference_doctype` / `reference_docname` keys become the record's
    /// document reference.
    pub async fn create_request_log(
        &self,
        data: Value,
        integration_type: &str,
        service_name: &str,
        name: Option<String>,
    ) -> AppResult<IntegrationRequest> {
        let data = match data {
            Value::String(raw) => serde_json::from_str(&raw)?,
            other => other,
        };
        let reference = DocRef::from_parts(
            data.get("reference_doctype").and_then(Value::as_str),
            data.get("reference_docname").and_then(Value::as_str),
        );
        self.create(NewIntegrationRequest {
            name,
            integration_type: integration_type.to_string(),
            integration_request_service: service_name.to_string(),
            reference,
            data: serde_json::to_string(&data)?,
        })
        .await
    }

    /// Inserts a prepared request.
    pub async fn create(&self, new: NewIntegrationRequest) -> AppResult<IntegrationRequest> {
        let now = Utc::now();
        let (reference_doctype, reference_docname) = match new.reference {
            Some(doc) => (Some(doc.doctype), Some(doc.name)),
            None => (None, None),
        };
        let request = IntegrationRequest {
            name: new.name.unwrap_or_else(|| Uuid::now_v7().to_string()),
            integration_type: new.integration_type,
            integration_request_service: new.integration_request_service,
            reference_doctype,
            reference_docname,
            data: new.data,
            status: IntegrationStatus::Queued,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&request).await?;

        info!(
            request = %request.name,
            service = %request.integration_request_service,
            integration_type = %request.integration_type,
            "Integration request logged"
        );
        Ok(request)
    }

    /// Loads a request.
    pub async fn get(&self, name: &str) -> AppResult<IntegrationRequest> {
        self.store
            .find(name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Integration Request {name} not found")))
    }

    /// Moves a request to `next`, enforcing the transition table.
    pub async fn set_status(
        &self,
        name: &str,
        next: IntegrationStatus,
    ) -> AppResult<IntegrationRequest> {
        self.transition(name, next, None).await
    }

    /// Marks a request failed with the error that caused it.
    pub async fn mark_failed(&self, name: &str, error: &str) -> AppResult<IntegrationRequest> {
        self.transition(name, IntegrationStatus::Failed, Some(error))
            .await
    }

    /// Requests of a service currently in `status`.
    pub async fn pending(
        &self,
        service: &str,
        status: IntegrationStatus,
    ) -> AppResult<Vec<IntegrationRequest>> {
        self.store.find_by_status(service, status).await
    }

    async fn transition(
        &self,
        name: &str,
        next: IntegrationStatus,
        error: Option<&str>,
    ) -> AppResult<IntegrationRequest> {
        let current = self.get(name).await?;
        if !current.status.can_transition_to(next) {
            warn!(
                request = %name,
                from = %current.status,
                to = %next,
                "Rejected integration request transition"
            );
            return Err(AppError::validation(format!(
                "Cannot change Integration Request {name} from {} to {next}",
                current.status
            )));
        }
        self.store.update_status(name, next, error).await?;
        info!(request = %name, from = %current.status, to = %next, "Integration request updated");
        self.get(name).await
    }
}
