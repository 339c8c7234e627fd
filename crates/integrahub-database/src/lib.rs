//! # integrahub-database
//!
//! Persistence for IntegraHub. Services depend only on the async store
//! traits in [`store`]; [`repositories`] implements them on PostgreSQL and
//! [`memory`] implements them in process memory for tests and
//! single-node runs.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{
    FileStore, IntegrationRequestStore, JobStore, SettingsStore, Stores, WebhookStore,
};
