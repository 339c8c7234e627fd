//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User that system jobs and hooks act as.
pub const ADMINISTRATOR: &str = "Administrator";

/// Context for the current request or job.
///
/// Passed into service methods so that every operation knows *who* is
/// acting when it checks document permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user.
    pub user: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for `user`.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            request_time: Utc::now(),
        }
    }

    /// Context for scheduler ticks and background jobs.
    pub fn system() -> Self {
        Self::new(ADMINISTRATOR)
    }

    /// Returns whether the acting user is the administrator.
    pub fn is_administrator(&self) -> bool {
        self.user == ADMINISTRATOR
    }
}
