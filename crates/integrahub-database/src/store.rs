//! Store traits consumed by the service layer.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use integrahub_core::result::AppResult;
use integrahub_core::types::DocRef;
use integrahub_entity::file::FileRecord;
use integrahub_entity::integration::{IntegrationRequest, IntegrationStatus};
use integrahub_entity::job::{CreateJob, Job};
use integrahub_entity::settings::{DropboxSettings, RazorpaySettings};
use integrahub_entity::webhook::{DocEvent, Webhook, WebhookSubscription};

/// Persistence for the file/folder tree.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a node by record name.
    async fn find(&self, name: &str) -> AppResult<Option<FileRecord>>;

    /// Find the home folder.
    async fn find_home(&self) -> AppResult<Option<FileRecord>>;

    /// Find a folder by parent and display name.
    async fn find_folder(
        &self,
        parent: Option<&str>,
        file_name: &str,
    ) -> AppResult<Option<FileRecord>>;

    /// Insert a node. A uniqueness violation yields a `Conflict` error.
    async fn insert(&self, record: &FileRecord) -> AppResult<()>;

    /// Delete a node. Returns whether a row was removed.
    async fn delete(&self, name: &str) -> AppResult<bool>;

    /// Direct children of a folder.
    async fn children(&self, folder: &str) -> AppResult<Vec<FileRecord>>;

    /// Set a node's size.
    async fn set_size(&self, name: &str, file_size: i64) -> AppResult<()>;

    /// Every node sharing a content hash.
    async fn find_by_hash(&self, content_hash: &str) -> AppResult<Vec<FileRecord>>;

    /// A file with the same hash attached to the same document, other than `exclude`.
    async fn find_attached_duplicate(
        &self,
        content_hash: &str,
        attached_to: &DocRef,
        exclude: &str,
    ) -> AppResult<Option<FileRecord>>;
}

/// Persistence for integration requests. Records are never deleted.
#[async_trait]
pub trait IntegrationRequestStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new request. A duplicate name yields a `Conflict` error.
    async fn insert(&self, request: &IntegrationRequest) -> AppResult<()>;

    /// Find a request by name.
    async fn find(&self, name: &str) -> AppResult<Option<IntegrationRequest>>;

    /// Overwrite status and error text.
    async fn update_status(
        &self,
        name: &str,
        status: IntegrationStatus,
        error: Option<&str>,
    ) -> AppResult<()>;

    /// Requests of a service in a given status, oldest first.
    async fn find_by_status(
        &self,
        service: &str,
        status: IntegrationStatus,
    ) -> AppResult<Vec<IntegrationRequest>>;
}

/// Read access to webhooks and their event rows.
#[async_trait]
pub trait WebhookStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a webhook by name.
    async fn find_webhook(&self, name: &str) -> AppResult<Option<Webhook>>;

    /// Enabled event rows listening on `(doctype, event)`.
    async fn enabled_subscriptions(
        &self,
        doctype: &str,
        event: DocEvent,
    ) -> AppResult<Vec<WebhookSubscription>>;

    /// Create or replace a webhook.
    async fn save_webhook(&self, webhook: &Webhook) -> AppResult<()>;

    /// Add an event row.
    async fn add_subscription(&self, subscription: &WebhookSubscription) -> AppResult<()>;
}

/// Single-record integration settings.
#[async_trait]
pub trait SettingsStore: Send + Sync + std::fmt::Debug + 'static {
    /// The Dropbox settings record; defaults when never saved.
    async fn dropbox(&self) -> AppResult<DropboxSettings>;

    /// Save the Dropbox settings record.
    async fn save_dropbox(&self, settings: &DropboxSettings) -> AppResult<()>;

    /// The Razorpay settings record; defaults when never saved.
    async fn razorpay(&self) -> AppResult<RazorpaySettings>;

    /// Save the Razorpay settings record.
    async fn save_razorpay(&self, settings: &RazorpaySettings) -> AppResult<()>;
}

/// Durable job queue.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create a pending job.
    async fn create(&self, data: CreateJob) -> AppResult<Job>;

    /// Find a job by ID.
    async fn find(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// Claim the oldest pending job on a queue, marking it running.
    async fn dequeue(&self, queue: &str, worker_id: &str) -> AppResult<Option<Job>>;

    /// Mark a job completed.
    async fn complete(&self, id: Uuid, result: Option<Value>) -> AppResult<()>;

    /// Mark a job failed.
    async fn fail(&self, id: Uuid, error_message: &str) -> AppResult<()>;

    /// Put a running job back to pending for another attempt.
    async fn retry(&self, id: Uuid, error_message: &str) -> AppResult<()>;
}

/// One handle per store, as wired into the services.
#[derive(Debug, Clone)]
pub struct Stores {
    /// File/folder tree.
    pub files: Arc<dyn FileStore>,
    /// Integration request log.
    pub integration_requests: Arc<dyn IntegrationRequestStore>,
    /// Webhook configuration.
    pub webhooks: Arc<dyn WebhookStore>,
    /// Integration settings records.
    pub settings: Arc<dyn SettingsStore>,
    /// Background job queue.
    pub jobs: Arc<dyn JobStore>,
}
