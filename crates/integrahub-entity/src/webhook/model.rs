//! Webhook and subscription row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::DocEvent;

/// The only authentication type deliveries support.
pub const BASIC_AUTHENTICATION: &str = "Basic Authentication";

/// A subscriber endpoint with its credentials.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Webhook {
    /// Webhook name.
    pub name: String,
    /// Whether deliveries are active.
    pub enabled: bool,
    /// Configured authentication type label.
    pub authentication_type: String,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// When the webhook was created.
    pub created_at: DateTime<Utc>,
    /// When the webhook was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Resolved credentials for a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAuth {
    /// HTTP basic authentication.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// A configured type deliveries do not speak.
    Unsupported(String),
}

impl Webhook {
    /// Resolves the credentials to send with a delivery.
    pub fn auth(&self) -> WebhookAuth {
        if self.authentication_type == BASIC_AUTHENTICATION {
            WebhookAuth::Basic {
                username: self.username.clone().unwrap_or_default(),
                password: self.password.clone().unwrap_or_default(),
            }
        } else {
            WebhookAuth::Unsupported(self.authentication_type.clone())
        }
    }
}

/// One event row of a webhook: which document events it listens to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookSubscription {
    /// Row identifier.
    pub id: Uuid,
    /// Owning webhook name.
    pub webhook: String,
    /// Doctype the row listens on.
    pub document_type: String,
    /// Event the row listens for.
    pub document_event: DocEvent,
    /// Target URI; `{name}` and `{doctype}` are substituted.
    pub resource_uri: String,
    /// Whether the row is active.
    pub enabled: bool,
}

impl WebhookSubscription {
    /// Fills the URI template for a document.
    pub fn render_uri(&self, doctype: &str, name: &str) -> String {
        self.resource_uri
            .replace("{name}", name)
            .replace("{doctype}", doctype)
    }
}
