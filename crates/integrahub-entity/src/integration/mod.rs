//! Integration request audit records.

pub mod model;
pub mod status;

pub use model::{IntegrationRequest, NewIntegrationRequest};
pub use status::IntegrationStatus;
