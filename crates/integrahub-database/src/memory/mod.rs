//! In-process implementations of the store traits.
//!
//! Used by the test suites and by single-node deployments that run with
//! `database.in_memory = true`. Data is lost on restart.

pub mod file;
pub mod integration;
pub mod job;
pub mod settings;
pub mod webhook;

pub use file::MemoryFileStore;
pub use integration::MemoryIntegrationRequestStore;
pub use job::MemoryJobStore;
pub use settings::MemorySettingsStore;
pub use webhook::MemoryWebhookStore;

use std::sync::Arc;

use crate::store::Stores;

impl Stores {
    /// A full set of empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            files: Arc::new(MemoryFileStore::new()),
            integration_requests: Arc::new(MemoryIntegrationRequestStore::new()),
            webhooks: Arc::new(MemoryWebhookStore::new()),
            settings: Arc::new(MemorySettingsStore::default()),
            jobs: Arc::new(MemoryJobStore::new()),
        }
    }
}
