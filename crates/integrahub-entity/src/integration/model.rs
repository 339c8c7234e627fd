//! Integration request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use integrahub_core::types::DocRef;

use super::status::IntegrationStatus;

/// One recorded call to or from a third-party service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IntegrationRequest {
    /// Record identifier.
    pub name: String,
    /// Direction / kind, e.g. `"Host"` or `"Remote"`.
    pub integration_type: String,
    /// Service the request belongs to, e.g. `"Razorpay"`.
    pub integration_request_service: String,
    /// Doctype of the originating document.
    pub reference_doctype: Option<String>,
    /// Name of the originating document.
    pub reference_docname: Option<String>,
    /// Serialized request payload (JSON text).
    pub data: String,
    /// Current status.
    pub status: IntegrationStatus,
    /// Error text for failed requests.
    pub error: Option<String>,
    /// When the request was recorded.
    pub created_at: DateTime<Utc>,
    /// When the request was last updated.
    pub updated_at: DateTime<Utc>,
}

impl IntegrationRequest {
    /// The originating document, if recorded.
    pub fn reference(&self) -> Option<DocRef> {
        DocRef::from_parts(
            self.reference_doctype.as_deref(),
            self.reference_docname.as_deref(),
        )
    }

    /// The payload parsed back into JSON.
    pub fn data_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.data)
    }
}

/// Data required to record a new integration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIntegrationRequest {
    /// Caller-chosen record name; generated when `None`.
    pub name: Option<String>,
    /// Direction / kind.
    pub integration_type: String,
    /// Service name.
    pub integration_request_service: String,
    /// Originating document.
    pub reference: Option<DocRef>,
    /// Serialized payload.
    pub data: String,
}
