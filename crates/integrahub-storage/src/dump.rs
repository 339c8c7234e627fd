//! Database dumps taken at the start of a backup run.

use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::process::Command;
use tracing::{error, info};

use integrahub_core::config::StorageConfig;
use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;

/// Produces a fresh database dump file.
#[async_trait]
pub trait DatabaseDumper: Send + Sync + Debug + 'static {
    /// Writes a new dump and returns its path.
    async fn dump(&self) -> AppResult<PathBuf>;
}

/// Dumps PostgreSQL with the `pg_dump` binary.
#[derive(Debug, Clone)]
pub struct PgDumpDumper {
    binary: String,
    database_url: String,
    output_dir: PathBuf,
}

impl PgDumpDumper {
    /// Creates a dumper writing into the configured backups directory.
    pub fn new(storage: &StorageConfig, database_url: impl Into<String>) -> Self {
        Self {
            binary: storage.pg_dump_path.clone(),
            database_url: database_url.into(),
            output_dir: PathBuf::from(&storage.backups_path),
        }
    }

    /// Directory dumps are written into.
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    fn file_name() -> String {
        format!("{}-database.dump", Utc::now().format("%Y%m%d_%H%M%S"))
    }
}

#[async_trait]
impl DatabaseDumper for PgDumpDumper {
    async fn dump(&self) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!(
                    "Failed to create backups directory: {}",
                    self.output_dir.display()
                ),
                e,
            )
        })?;
        let path = self.output_dir.join(Self::file_name());

        let output = Command::new(&self.binary)
            .arg("--format=custom")
            .arg("--no-owner")
            .arg("--file")
            .arg(&path)
            .arg("--dbname")
            .arg(&self.database_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to run {}", self.binary),
                    e,
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(
                binary = %self.binary,
                exit_code = ?output.status.code(),
                stderr = %stderr,
                "Database dump failed"
            );
            return Err(AppError::storage(format!("Database dump failed: {stderr}")));
        }

        let size = match fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(_) => {
                return Err(AppError::storage(format!(
                    "Database dump finished but {} was not created",
                    path.display()
                )));
            }
        };
        info!(path = %path.display(), bytes = size, "Database dump written");
        Ok(path)
    }
}
