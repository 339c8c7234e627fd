//! Single-record settings repository.

use async_trait::async_trait;
use sqlx::PgPool;

use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;
use integrahub_entity::settings::{DropboxSettings, RazorpaySettings};

use crate::store::SettingsStore;

/// Repository for `dropbox_settings` and `razorpay_settings`.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn dropbox(&self) -> AppResult<DropboxSettings> {
        let row = sqlx::query_as::<_, DropboxSettings>(
            "SELECT enabled, app_access_key, app_secret_key, dropbox_access_token, \
             dropbox_refresh_token, backup_frequency, send_notifications_to, updated_at \
             FROM dropbox_settings WHERE id",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load Dropbox settings", e)
        })?;
        Ok(row.unwrap_or_default())
    }

    async fn save_dropbox(&self, settings: &DropboxSettings) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO dropbox_settings (id, enabled, app_access_key, app_secret_key, \
             dropbox_access_token, dropbox_refresh_token, backup_frequency, \
             send_notifications_to, updated_at) \
             VALUES (TRUE, $1, $2, $3, $4, $5, $6, $7, NOW()) \
             ON CONFLICT (id) DO UPDATE SET enabled = EXCLUDED.enabled, \
             app_access_key = EXCLUDED.app_access_key, app_secret_key = EXCLUDED.app_secret_key, \
             dropbox_access_token = EXCLUDED.dropbox_access_token, \
             dropbox_refresh_token = EXCLUDED.dropbox_refresh_token, \
             backup_frequency = EXCLUDED.backup_frequency, \
             send_notifications_to = EXCLUDED.send_notifications_to, updated_at = NOW()",
        )
        .bind(settings.enabled)
        .bind(&settings.app_access_key)
        .bind(&settings.app_secret_key)
        .bind(&settings.dropbox_access_token)
        .bind(&settings.dropbox_refresh_token)
        .bind(settings.backup_frequency)
        .bind(&settings.send_notifications_to)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save Dropbox settings", e)
        })?;
        Ok(())
    }

    async fn razorpay(&self) -> AppResult<RazorpaySettings> {
        let row = sqlx::query_as::<_, RazorpaySettings>(
            "SELECT enabled, api_key, api_secret, updated_at FROM razorpay_settings WHERE id",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load Razorpay settings", e)
        })?;
        Ok(row.unwrap_or_default())
    }

    async fn save_razorpay(&self, settings: &RazorpaySettings) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO razorpay_settings (id, enabled, api_key, api_secret, updated_at) \
             VALUES (TRUE, $1, $2, $3, NOW()) \
             ON CONFLICT (id) DO UPDATE SET enabled = EXCLUDED.enabled, \
             api_key = EXCLUDED.api_key, api_secret = EXCLUDED.api_secret, updated_at = NOW()",
        )
        .bind(settings.enabled)
        .bind(&settings.api_key)
        .bind(&settings.api_secret)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save Razorpay settings", e)
        })?;
        Ok(())
    }
}
