//! Outgoing email.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// A single outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    /// Recipient addresses.
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub body: String,
}

/// Sends email through whatever transport the deployment provides.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    /// Queue or send a message.
    async fn send(&self, message: MailMessage) -> AppResult<()>;
}

/// Splits a recipient list separated by commas or newlines.
pub fn split_emails(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_emails_mixed_separators() {
        let parsed = split_emails("ops@example.com, admin@example.com\n\n  cto@example.com ");
        assert_eq!(
            parsed,
            vec!["ops@example.com", "admin@example.com", "cto@example.com"]
        );
    }
}
