//! Third-party integration configuration.
//!
//! Values here are the site-level fallback used when the matching
//! settings record does not carry a credential.

use serde::{Deserialize, Serialize};

/// Dropbox backup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropboxConfig {
    /// Fallback app key.
    #[serde(default)]
    pub app_key: Option<String>,
    /// Fallback app secret.
    #[serde(default)]
    pub app_secret: Option<String>,
    /// Fallback access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Fallback OAuth redirect URI.
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// RPC endpoint base.
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    /// Content upload endpoint base.
    #[serde(default = "default_content_base")]
    pub content_base_url: String,
    /// OAuth authorize page.
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    /// Upload threshold and chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,
    /// How many times a run may renew its session after token expiry.
    #[serde(default = "default_max_renewals")]
    pub max_session_renewals: u32,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            app_key: None,
            app_secret: None,
            access_token: None,
            redirect_uri: None,
            api_base_url: default_api_base(),
            content_base_url: default_content_base(),
            authorize_url: default_authorize_url(),
            chunk_size_bytes: default_chunk_size(),
            max_session_renewals: default_max_renewals(),
        }
    }
}

/// Razorpay payment gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayConfig {
    /// REST API base.
    #[serde(default = "default_razorpay_base")]
    pub api_base_url: String,
    /// Key used when a request asks for the sandbox.
    #[serde(default)]
    pub sandbox_api_key: Option<String>,
    /// Secret used when a request asks for the sandbox.
    #[serde(default)]
    pub sandbox_api_secret: Option<String>,
    /// Currencies the gateway accepts.
    #[serde(default = "default_currencies")]
    pub supported_currencies: Vec<String>,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_razorpay_base(),
            sandbox_api_key: None,
            sandbox_api_secret: None,
            supported_currencies: default_currencies(),
        }
    }
}

/// Outgoing mail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender address for notifications.
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.dropboxapi.com".to_string()
}

fn default_content_base() -> String {
    "https://content.dropboxapi.com".to_string()
}

fn default_authorize_url() -> String {
    "https://www.dropbox.com/oauth2/authorize".to_string()
}

fn default_chunk_size() -> u64 {
    4 * 1024 * 1024
}

fn default_max_renewals() -> u32 {
    10
}

fn default_razorpay_base() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_currencies() -> Vec<String> {
    vec!["INR".to_string()]
}

fn default_sender() -> String {
    "notifications@localhost".to_string()
}
