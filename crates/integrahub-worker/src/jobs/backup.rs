//! Dropbox backup job handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use integrahub_entity::backup::BackupReport;
use integrahub_entity::job::{BackupCheckPayload, Job, job_types};
use integrahub_service::DropboxBackupService;

use super::classify;
use crate::executor::{JobExecutionError, JobHandler};

/// Runs backups queued by hand and the scheduler's frequency checks.
#[derive(Debug)]
pub struct BackupJobHandler {
    service: Arc<DropboxBackupService>,
}

impl BackupJobHandler {
    /// Create a new backup job handler.
    pub fn new(service: Arc<DropboxBackupService>) -> Self {
        Self { service }
    }

    async fn backup_now(&self) -> Result<Option<BackupReport>, JobExecutionError> {
        self.service.take_backup_to_dropbox().await.map_err(classify)
    }

    async fn backup_if_due(&self, job: &Job) -> Result<Option<BackupReport>, JobExecutionError> {
        let payload: BackupCheckPayload = serde_json::from_value(job.payload.clone())
            .map_err(JobExecutionError::invalid_payload::<BackupCheckPayload>)?;
        self.service
            .take_backups_if(payload.frequency)
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl JobHandler for BackupJobHandler {
    fn job_types(&self) -> &[&'static str] {
        &[job_types::DROPBOX_BACKUP, job_types::BACKUP_CHECK]
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let report = match job.job_type.as_str() {
            job_types::DROPBOX_BACKUP => self.backup_now().await?,
            job_types::BACKUP_CHECK => self.backup_if_due(job).await?,
            other => {
                return Err(JobExecutionError::Permanent(format!(
                    "Unknown backup job type: {other}"
                )));
            }
        };

        let Some(report) = report else {
            info!(job_id = %job.id, "No backup due");
            return Ok(Some(json!({ "ran": false })));
        };
        info!(
            job_id = %job.id,
            uploaded = report.uploaded.len(),
            failed = report.failures.len(),
            "Backup run finished"
        );
        Ok(Some(json!({ "ran": true, "report": report })))
    }
}
