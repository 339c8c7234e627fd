//! Razorpay gateway settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The Razorpay settings record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct RazorpaySettings {
    /// Whether the gateway is enabled.
    pub enabled: bool,
    /// API key id.
    pub api_key: Option<String>,
    /// API key secret.
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
    /// Last update.
    pub updated_at: Option<DateTime<Utc>>,
}

impl RazorpaySettings {
    /// Whether both halves of the credential are present.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.api_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}
