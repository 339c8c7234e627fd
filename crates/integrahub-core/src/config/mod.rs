//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod database;
pub mod http;
pub mod integrations;
pub mod logging;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{ServerConfig, SiteConfig};
pub use self::database::DatabaseConfig;
pub use self::http::HttpConfig;
pub use self::integrations::{DropboxConfig, MailConfig, RazorpayConfig};
pub use self::logging::LoggingConfig;
pub use self::storage::StorageConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Public site settings.
    #[serde(default)]
    pub site: SiteConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Local file and backup storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Dropbox fallback credentials and API endpoints.
    #[serde(default)]
    pub dropbox: DropboxConfig,
    /// Razorpay fallback credentials and API endpoint.
    #[serde(default)]
    pub razorpay: RazorpayConfig,
    /// Outgoing mail settings.
    #[serde(default)]
    pub mail: MailConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `INTEGRAHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("INTEGRAHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
