//! In-memory webhook configuration.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use integrahub_core::result::AppResult;
use integrahub_entity::webhook::{DocEvent, Webhook, WebhookSubscription};

use crate::store::WebhookStore;

/// Webhook store holding webhooks and their event rows.
#[derive(Debug, Default)]
pub struct MemoryWebhookStore {
    webhooks: DashMap<String, Webhook>,
    subscriptions: DashMap<Uuid, WebhookSubscription>,
}

impl MemoryWebhookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookStore for MemoryWebhookStore {
    async fn find_webhook(&self, name: &str) -> AppResult<Option<Webhook>> {
        Ok(self.webhooks.get(name).map(|w| w.value().clone()))
    }

    async fn enabled_subscriptions(
        &self,
        doctype: &str,
        event: DocEvent,
    ) -> AppResult<Vec<WebhookSubscription>> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.enabled && s.document_type == doctype && s.document_event == event)
            .map(|s| s.value().clone())
            .collect())
    }

    async fn save_webhook(&self, webhook: &Webhook) -> AppResult<()> {
        self.webhooks.insert(webhook.name.clone(), webhook.clone());
        Ok(())
    }

    async fn add_subscription(&self, subscription: &WebhookSubscription) -> AppResult<()> {
        self.subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(())
    }
}
