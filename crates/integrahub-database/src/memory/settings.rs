//! In-memory settings records.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use integrahub_core::result::AppResult;
use integrahub_entity::settings::{DropboxSettings, RazorpaySettings};

use crate::store::SettingsStore;

/// Settings store holding one record per integration.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    dropbox: RwLock<DropboxSettings>,
    razorpay: RwLock<RazorpaySettings>,
}

impl MemorySettingsStore {
    /// Create a store seeded with the given records.
    pub fn with(dropbox: DropboxSettings, razorpay: RazorpaySettings) -> Self {
        Self {
            dropbox: RwLock::new(dropbox),
            razorpay: RwLock::new(razorpay),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn dropbox(&self) -> AppResult<DropboxSettings> {
        Ok(self.dropbox.read().await.clone())
    }

    async fn save_dropbox(&self, settings: &DropboxSettings) -> AppResult<()> {
        let mut saved = settings.clone();
        saved.updated_at = Some(Utc::now());
        *self.dropbox.write().await = saved;
        Ok(())
    }

    async fn razorpay(&self) -> AppResult<RazorpaySettings> {
        Ok(self.razorpay.read().await.clone())
    }

    async fn save_razorpay(&self, settings: &RazorpaySettings) -> AppResult<()> {
        let mut saved = settings.clone();
        saved.updated_at = Some(Utc::now());
        *self.razorpay.write().await = saved;
        Ok(())
    }
}
