//! Outbound webhooks fired on document lifecycle events.

pub mod dispatcher;

pub use dispatcher::{DeliveryOutcome, WebhookDispatcher, http_method};
