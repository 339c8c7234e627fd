//! Webhook subscription entities.

pub mod event;
pub mod model;

pub use event::DocEvent;
pub use model::{BASIC_AUTHENTICATION, Webhook, WebhookAuth, WebhookSubscription};
