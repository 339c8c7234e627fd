//! Outbound HTTP client configuration.

use serde::{Deserialize, Serialize};

/// Settings for the shared outbound HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Optional request timeout; unset means the client default.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: None,
        }
    }
}

fn default_user_agent() -> String {
    concat!("integrahub/", env!("CARGO_PKG_VERSION")).to_string()
}
