//! Webhook delivery job handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use integrahub_entity::job::{Job, WebhookDeliveryPayload, job_types};
use integrahub_service::{DeliveryOutcome, WebhookDispatcher};

use crate::executor::{JobExecutionError, JobHandler};

/// Performs one queued webhook call.
///
/// Failed calls are not retried.
#[derive(Debug)]
pub struct WebhookJobHandler {
    dispatcher: Arc<WebhookDispatcher>,
}

impl WebhookJobHandler {
    /// Create a new webhook job handler.
    pub fn new(dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl JobHandler for WebhookJobHandler {
    fn job_types(&self) -> &[&'static str] {
        &[job_types::WEBHOOK_DELIVERY]
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: WebhookDeliveryPayload = serde_json::from_value(job.payload.clone())
            .map_err(JobExecutionError::invalid_payload::<WebhookDeliveryPayload>)?;

        match self.dispatcher.deliver(&payload).await {
            DeliveryOutcome::Delivered(status) => Ok(Some(json!({ "status": status }))),
            DeliveryOutcome::Skipped(reason) => Ok(Some(json!({ "skipped": reason }))),
            DeliveryOutcome::Failed(error) => Err(JobExecutionError::Permanent(error)),
        }
    }
}
