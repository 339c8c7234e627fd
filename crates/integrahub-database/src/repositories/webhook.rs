//! Webhook repository.

use async_trait::async_trait;
use sqlx::PgPool;

use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;
use integrahub_entity::webhook::{DocEvent, Webhook, WebhookSubscription};

use super::map_insert_error;
use crate::store::WebhookStore;

/// Repository for `webhooks` and `webhook_subscriptions`.
#[derive(Debug, Clone)]
pub struct WebhookRepository {
    pool: PgPool,
}

impl WebhookRepository {
    /// Create a new webhook repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookStore for WebhookRepository {
    async fn find_webhook(&self, name: &str) -> AppResult<Option<Webhook>> {
        sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find webhook", e))
    }

    async fn enabled_subscriptions(
        &self,
        doctype: &str,
        event: DocEvent,
    ) -> AppResult<Vec<WebhookSubscription>> {
        sqlx::query_as::<_, WebhookSubscription>(
            "SELECT * FROM webhook_subscriptions \
             WHERE document_type = $1 AND document_event = $2 AND enabled",
        )
        .bind(doctype)
        .bind(event)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list webhook subscriptions", e)
        })
    }

    async fn save_webhook(&self, webhook: &Webhook) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO webhooks (name, enabled, authentication_type, username, password, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (name) DO UPDATE SET enabled = EXCLUDED.enabled, \
             authentication_type = EXCLUDED.authentication_type, \
             username = EXCLUDED.username, password = EXCLUDED.password, updated_at = NOW()",
        )
        .bind(&webhook.name)
        .bind(webhook.enabled)
        .bind(&webhook.authentication_type)
        .bind(&webhook.username)
        .bind(&webhook.password)
        .bind(webhook.created_at)
        .bind(webhook.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save webhook", e))?;
        Ok(())
    }

    async fn add_subscription(&self, subscription: &WebhookSubscription) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO webhook_subscriptions (id, webhook, document_type, document_event, \
             resource_uri, enabled) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(subscription.id)
        .bind(&subscription.webhook)
        .bind(&subscription.document_type)
        .bind(subscription.document_event)
        .bind(&subscription.resource_uri)
        .bind(subscription.enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "Webhook subscription"))?;
        Ok(())
    }
}
