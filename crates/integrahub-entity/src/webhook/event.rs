//! Document lifecycle events that can trigger a webhook.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A document lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "doc_event")]
pub enum DocEvent {
    /// The document was inserted.
    Create,
    /// The document was saved.
    Save,
    /// The document was submitted.
    Submit,
    /// The document was cancelled.
    Cancel,
    /// The document was deleted.
    Delete,
}

impl DocEvent {
    /// Return the event name as configured on subscriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Save => "Save",
            Self::Submit => "Submit",
            Self::Cancel => "Cancel",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for DocEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DocEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Create" => Ok(Self::Create),
            "Save" => Ok(Self::Save),
            "Submit" => Ok(Self::Submit),
            "Cancel" => Ok(Self::Cancel),
            "Delete" => Ok(Self::Delete),
            other => Err(format!("Unknown document event: {other}")),
        }
    }
}
