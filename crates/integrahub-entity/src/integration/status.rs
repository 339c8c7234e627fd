//! Integration request status and its transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an integration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "integration_status")]
pub enum IntegrationStatus {
    /// Recorded, nothing confirmed yet.
    Queued,
    /// The processor authorized the payment.
    Authorized,
    /// The processor captured the payment.
    Completed,
    /// The attempt failed; see the error text.
    Failed,
}

impl IntegrationStatus {
    /// Check if the request is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: IntegrationStatus) -> bool {
        match (self, next) {
            (Self::Queued, Self::Authorized) => true,
            (Self::Authorized, Self::Completed) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Return the status as it is stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Authorized => "Authorized",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
