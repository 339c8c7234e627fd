//! Typed job payload definitions and well-known keys.

use serde::{Deserialize, Serialize};

use integrahub_core::types::Document;

use crate::settings::BackupFrequency;
use crate::webhook::DocEvent;

/// Handler keys.
pub mod job_types {
    /// Run a Dropbox backup now.
    pub const DROPBOX_BACKUP: &str = "dropbox_backup";
    /// Run a Dropbox backup if the configured frequency matches.
    pub const BACKUP_CHECK: &str = "backup_check";
    /// Deliver one webhook call.
    pub const WEBHOOK_DELIVERY: &str = "webhook_delivery";
    /// Sweep authorized payments and capture them.
    pub const PAYMENT_CAPTURE: &str = "payment_capture";
}

/// Queue names, in the order the runner polls them.
pub mod queues {
    /// Short, latency-sensitive work.
    pub const CRITICAL: &str = "critical";
    /// Everything else.
    pub const DEFAULT: &str = "default";
    /// Work that may run for many minutes.
    pub const LONG: &str = "long";
}

/// Payload of a `webhook_delivery` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookDeliveryPayload {
    /// Snapshot of the document that triggered the event.
    pub document: Document,
    /// The lifecycle event.
    pub event: DocEvent,
    /// Name of the webhook to deliver through.
    pub webhook: String,
    /// Resource URI of the matching subscription row, placeholders filled.
    pub resource_uri: String,
}

/// Payload of a `backup_check` job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupCheckPayload {
    /// Cadence of the scheduler tick that enqueued the check.
    pub frequency: BackupFrequency,
}
