//! Dropbox backup settings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How often scheduled backups run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "backup_frequency")]
pub enum BackupFrequency {
    /// Once per day.
    Daily,
    /// Once per week.
    Weekly,
}

impl fmt::Display for BackupFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "Daily"),
            Self::Weekly => write!(f, "Weekly"),
        }
    }
}

impl FromStr for BackupFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Daily" => Ok(Self::Daily),
            "Weekly" => Ok(Self::Weekly),
            other => Err(format!("Unknown backup frequency: {other}")),
        }
    }
}

/// The Dropbox settings record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct DropboxSettings {
    /// Whether backups to Dropbox are enabled.
    pub enabled: bool,
    /// App key; falls back to site config when unset.
    pub app_access_key: Option<String>,
    /// App secret; falls back to site config when unset.
    #[serde(skip_serializing)]
    pub app_secret_key: Option<String>,
    /// OAuth access token obtained through the authorize flow.
    #[serde(skip_serializing)]
    pub dropbox_access_token: Option<String>,
    /// OAuth refresh token used to renew expired sessions.
    #[serde(skip_serializing)]
    pub dropbox_refresh_token: Option<String>,
    /// Scheduled cadence.
    pub backup_frequency: Option<BackupFrequency>,
    /// Comma or newline separated notification recipients.
    pub send_notifications_to: Option<String>,
    /// Last update.
    pub updated_at: Option<DateTime<Utc>>,
}
