//! Local storage configuration.

use serde::{Deserialize, Serialize};

/// Where file content and backup artifacts live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for publicly served files.
    #[serde(default = "default_public_root")]
    pub public_files_path: String,
    /// Root directory for private files.
    #[serde(default = "default_private_root")]
    pub private_files_path: String,
    /// Directory receiving database dumps.
    #[serde(default = "default_backups_path")]
    pub backups_path: String,
    /// `pg_dump` executable used to produce database dumps.
    #[serde(default = "default_pg_dump")]
    pub pg_dump_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_files_path: default_public_root(),
            private_files_path: default_private_root(),
            backups_path: default_backups_path(),
            pg_dump_path: default_pg_dump(),
        }
    }
}

fn default_public_root() -> String {
    "./data/public/files".to_string()
}

fn default_private_root() -> String {
    "./data/private/files".to_string()
}

fn default_backups_path() -> String {
    "./data/private/backups".to_string()
}

fn default_pg_dump() -> String {
    "pg_dump".to_string()
}
