//! Audit log of calls to and from third-party services.

pub mod log;

pub use log::IntegrationLog;
