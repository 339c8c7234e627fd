//! Mail delivery used when no transport is wired in.

use async_trait::async_trait;
use tracing::info;

use integrahub_core::config::MailConfig;
use integrahub_core::result::AppResult;
use integrahub_core::traits::{MailMessage, Mailer};

/// Writes outgoing mail to the log instead of sending it.
#[derive(Debug, Clone)]
pub struct LoggingMailer {
    sender: String,
}

impl LoggingMailer {
    /// Creates a mailer sending as the configured sender.
    pub fn new(config: &MailConfig) -> Self {
        Self {
            sender: config.sender.clone(),
        }
    }
}

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        info!(
            from = %self.sender,
            to = ?message.recipients,
            subject = %message.subject,
            body_len = message.body.len(),
            "Email queued"
        );
        Ok(())
    }
}
