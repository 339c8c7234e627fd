//! Webhook lookup, hand-off and delivery.
//!
//! Dispatch never fails the triggering save: lookup and enqueue errors are
//! logged and dropped, and delivery reports a [`DeliveryOutcome`] instead of
//! an error.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use integrahub_core::result::AppResult;
use integrahub_core::traits::{DocumentRegistry, JobEnqueuer, JobRequest};
use integrahub_core::types::Document;
use integrahub_database::WebhookStore;
use integrahub_entity::job::{WebhookDeliveryPayload, job_types, queues};
use integrahub_entity::webhook::{DocEvent, WebhookAuth};
use integrahub_http::{Auth, HttpClient, Method, RequestSpec};

const REDACTED: &str = "*****";

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing was sent.
    Skipped(String),
    /// The subscriber accepted the call with this status.
    Delivered(u16),
    /// The call failed.
    Failed(String),
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Delivered(status) => write!(f, "delivered: HTTP {status}"),
            Self::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

/// HTTP verb a webhook call uses for an event.
pub fn http_method(event: DocEvent) -> Method {
    match event {
        DocEvent::Create => Method::POST,
        DocEvent::Save | DocEvent::Submit | DocEvent::Cancel => Method::PUT,
        DocEvent::Delete => Method::DELETE,
    }
}

/// Looks up subscriptions and delivers webhook calls.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    webhooks: Arc<dyn WebhookStore>,
    registry: Arc<dyn DocumentRegistry>,
    enqueuer: Arc<dyn JobEnqueuer>,
    http: HttpClient,
}

impl WebhookDispatcher {
    /// Creates a dispatcher.
    pub fn new(
        webhooks: Arc<dyn WebhookStore>,
        registry: Arc<dyn DocumentRegistry>,
        enqueuer: Arc<dyn JobEnqueuer>,
        http: HttpClient,
    ) -> Self {
        Self {
            webhooks,
            registry,
            enqueuer,
            http,
        }
    }

    /// Enqueues one delivery job per enabled subscription matching the
    /// document's type and `event`. Returns how many were enqueued.
    pub async fn dispatch(&self, document: &Document, event: DocEvent) -> usize {
        let subscriptions = match self
            .webhooks
            .enabled_subscriptions(&document.doctype, event)
            .await
        {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(doctype = %document.doctype, %event, error = %e, "Webhook lookup failed");
                return 0;
            }
        };

        let mut enqueued = 0;
        for subscription in subscriptions {
            match self.webhooks.find_webhook(&subscription.webhook).await {
                Ok(Some(webhook)) if webhook.enabled => {}
                Ok(_) => {
                    debug!(webhook = %subscription.webhook, "Webhook disabled or missing");
                    continue;
                }
                Err(e) => {
                    error!(webhook = %subscription.webhook, error = %e, "Webhook lookup failed");
                    continue;
                }
            }

            let payload = WebhookDeliveryPayload {
                document: document.clone(),
                event,
                resource_uri: subscription.render_uri(&document.doctype, &document.name),
                webhook: subscription.webhook,
            };
            match self.enqueue(&payload).await {
                Ok(()) => enqueued += 1,
                Err(e) => error!(
                    webhook = %payload.webhook,
                    document = %document.doc_ref(),
                    error = %e,
                    "Failed to enqueue webhook delivery"
                ),
            }
        }
        enqueued
    }

    async fn enqueue(&self, payload: &WebhookDeliveryPayload) -> AppResult<()> {
        let request = JobRequest::new(job_types::WEBHOOK_DELIVERY, serde_json::to_value(payload)?)
            .on_queue(queues::DEFAULT);
        let job_id = self.enqueuer.enqueue(request).await?;
        debug!(webhook = %payload.webhook, job_id = %job_id, "Webhook delivery enqueued");
        Ok(())
    }

    /// Performs one webhook call. Never retried.
    pub async fn deliver(&self, payload: &WebhookDeliveryPayload) -> DeliveryOutcome {
        let outcome = self.try_deliver(payload).await;
        match &outcome {
            DeliveryOutcome::Delivered(status) => info!(
                webhook = %payload.webhook,
                uri = %payload.resource_uri,
                status,
                "Webhook delivered"
            ),
            DeliveryOutcome::Skipped(reason) => {
                debug!(webhook = %payload.webhook, reason = %reason, "Webhook skipped")
            }
            DeliveryOutcome::Failed(err) => warn!(
                webhook = %payload.webhook,
                uri = %payload.resource_uri,
                error = %err,
                "Webhook delivery failed"
            ),
        }
        outcome
    }

    async fn try_deliver(&self, payload: &WebhookDeliveryPayload) -> DeliveryOutcome {
        let webhook = match self.webhooks.find_webhook(&payload.webhook).await {
            Ok(Some(webhook)) => webhook,
            Ok(None) => {
                return DeliveryOutcome::Skipped(format!("Webhook {} not found", payload.webhook));
            }
            Err(e) => return DeliveryOutcome::Failed(e.to_string()),
        };
        if !webhook.enabled {
            return DeliveryOutcome::Skipped(format!("Webhook {} is disabled", webhook.name));
        }
        let auth = match webhook.auth() {
            WebhookAuth::Basic { username, password } => Auth::basic(username, password),
            WebhookAuth::Unsupported(kind) => {
                return DeliveryOutcome::Skipped(format!("Unsupported authentication type {kind}"));
            }
        };
        let body = match self.prepare_document(&payload.document).await {
            Ok(body) => body,
            Err(e) => return DeliveryOutcome::Failed(e.to_string()),
        };

        let spec = RequestSpec::new(http_method(payload.event), payload.resource_uri.as_str())
            .auth(auth)
            .json(body);

        match self.http.send(spec).await {
            Ok(response) if response.is_success() => DeliveryOutcome::Delivered(response.status),
            Ok(response) => DeliveryOutcome::Failed(format!(
                "HTTP {}: {}",
                response.status,
                response.text()
            )),
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        }
    }

    /// Serializes the document with password fields decrypted or redacted.
    async fn prepare_document(&self, document: &Document) -> AppResult<Value> {
        let mut body = document.to_json();
        let fields = self.registry.password_fields(&document.doctype).await?;
        if fields.is_empty() {
            return Ok(body);
        }
        let doc = document.doc_ref();
        if let Value::Object(object) = &mut body {
            for field in fields {
                if !object.contains_key(&field) {
                    continue;
                }
                let value = self
                    .registry
                    .get_password(&doc, &field)
                    .await?
                    .unwrap_or_else(|| REDACTED.to_string());
                object.insert(field, Value::String(value));
            }
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_to_method() {
        assert_eq!(http_method(DocEvent::Create), Method::POST);
        assert_eq!(http_method(DocEvent::Save), Method::PUT);
        assert_eq!(http_method(DocEvent::Submit), Method::PUT);
        assert_eq!(http_method(DocEvent::Cancel), Method::PUT);
        assert_eq!(http_method(DocEvent::Delete), Method::DELETE);
    }
}
