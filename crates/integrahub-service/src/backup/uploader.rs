//! Backup run: dump, diff against the remote listing, upload.

use std::sync::Arc;

use bytes::Bytes;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_entity::backup::{
    BackupReport, BackupStage, BackupTarget, LocalArtifact, UploadFailure,
};
use integrahub_storage::cloud::{CloudConnector, CloudStorageError, UploadCursor};
use integrahub_storage::{DatabaseDumper, list_artifacts};

use super::session::CloudSession;

/// Remote folder receiving database dumps.
pub const DATABASE_FOLDER: &str = "/database";
/// Remote folder receiving public files.
pub const PUBLIC_FILES_FOLDER: &str = "/files";
/// Remote folder receiving private files.
pub const PRIVATE_FILES_FOLDER: &str = "/private/files";

/// Uploads local artifacts that the remote side does not have yet.
#[derive(Debug, Clone)]
pub struct BackupUploader {
    connector: Arc<dyn CloudConnector>,
    dumper: Arc<dyn DatabaseDumper>,
    file_targets: Vec<BackupTarget>,
    chunk_size: u64,
    max_renewals: u32,
}

impl BackupUploader {
    /// Creates an uploader for the given file roots.
    pub fn new(
        connector: Arc<dyn CloudConnector>,
        dumper: Arc<dyn DatabaseDumper>,
        file_targets: Vec<BackupTarget>,
        chunk_size: u64,
        max_renewals: u32,
    ) -> Self {
        Self {
            connector,
            dumper,
            file_targets,
            chunk_size: chunk_size.max(1),
            max_renewals,
        }
    }

    /// Runs one backup.
    ///
    /// The database dump must upload for the run to continue; file uploads
    /// fail one at a time and are listed in the report.
    pub async fn run(&self) -> BackupReport {
        info!(stage = %BackupStage::Dumping, "Backup run started");
        let dump = match self.dump().await {
            Ok(dump) => dump,
            Err(e) => {
                error!(error = %e, "Database dump failed");
                return BackupReport::aborted(e.message);
            }
        };

        let connector = Arc::clone(&self.connector);
        let mut session = match CloudSession::open(connector, self.max_renewals).await {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Failed to connect to cloud storage");
                return BackupReport::aborted(e.to_string());
            }
        };

        let mut report = BackupReport {
            stage: BackupStage::Diffing,
            uploaded: Vec::new(),
            failures: Vec::new(),
            error: None,
        };

        let database = BackupTarget::new(
            dump.path.parent().map(|p| p.to_path_buf()).unwrap_or_default(),
            DATABASE_FOLDER,
        );
        let pending = match self.diff(&mut session, &database, vec![dump]).await {
            Ok(pending) => pending,
            Err(e) => return abort(report, e),
        };
        report.stage = BackupStage::Uploading;
        for artifact in pending {
            let remote_path = database.remote_path(&artifact.name);
            if let Err(e) = self.upload_file(&mut session, &artifact, &remote_path).await {
                return abort(report, e);
            }
            report.uploaded.push(remote_path);
        }

        for target in &self.file_targets {
            report.stage = BackupStage::Diffing;
            let pending = match self.pending(&mut session, target).await {
                Ok(pending) => pending,
                Err(e) => return abort(report, e),
            };
            report.stage = BackupStage::Uploading;
            for artifact in pending {
                let remote_path = target.remote_path(&artifact.name);
                match self.upload_file(&mut session, &artifact, &remote_path).await {
                    Ok(()) => report.uploaded.push(remote_path),
                    Err(e) => {
                        warn!(file = %artifact.path.display(), error = %e, "File did not upload");
                        report.failures.push(UploadFailure {
                            file_name: artifact.path.display().to_string(),
                            error: e.message,
                        });
                    }
                }
            }
        }

        report.stage = if report.failures.is_empty() {
            BackupStage::Done
        } else {
            BackupStage::Failed
        };
        info!(
            stage = %report.stage,
            uploaded = report.uploaded.len(),
            failed = report.failures.len(),
            renewals = session.retry_state().renewals,
            "Backup run finished"
        );
        report
    }

    async fn dump(&self) -> AppResult<LocalArtifact> {
        let path = self.dumper.dump().await?;
        let size = fs::metadata(&path).await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::storage(format!("Invalid dump path {}", path.display())))?;
        Ok(LocalArtifact { name, path, size })
    }

    /// Local files of `target` missing from its remote folder.
    pub async fn pending(
        &self,
        session: &mut CloudSession,
        target: &BackupTarget,
    ) -> AppResult<Vec<LocalArtifact>> {
        let local = list_artifacts(&target.local_dir).await?;
        self.diff(session, target, local).await
    }

    async fn diff(
        &self,
        session: &mut CloudSession,
        target: &BackupTarget,
        local: Vec<LocalArtifact>,
    ) -> AppResult<Vec<LocalArtifact>> {
        let folder = target.remote_folder.clone();
        let remote = match session
            .call(|client| {
                let folder = folder.clone();
                async move { client.list_folder(&folder).await }
            })
            .await
        {
            Ok(remote) => remote,
            Err(CloudStorageError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let pending: Vec<LocalArtifact> = local
            .into_iter()
            .filter(|artifact| !artifact.is_uploaded(&remote))
            .collect();
        info!(
            folder = %target.remote_folder,
            remote = remote.len(),
            pending = pending.len(),
            "Compared local files against remote listing"
        );
        Ok(pending)
    }

    /// Uploads one file, in one request up to the chunk size and through an
    /// upload session above it.
    pub async fn upload_file(
        &self,
        session: &mut CloudSession,
        artifact: &LocalArtifact,
        remote_path: &str,
    ) -> AppResult<()> {
        let path = remote_path.to_string();
        if let Some((folder, _)) = remote_path.rsplit_once('/').filter(|(f, _)| !f.is_empty()) {
            ensure_folder(session, folder).await?;
        }

        if artifact.size <= self.chunk_size {
            let data = Bytes::from(fs::read(&artifact.path).await?);
            session
                .call(|client| {
                    let (path, data) = (path.clone(), data.clone());
                    async move { client.upload(&path, data).await }
                })
                .await?;
            info!(file = %path, bytes = artifact.size, "Uploaded file");
            return Ok(());
        }

        let mut file = File::open(&artifact.path).await?;
        let first = read_chunk(&mut file, self.chunk_size).await?;
        let session_id = session
            .call(|client| {
                let first = first.clone();
                async move { client.start_session(first).await }
            })
            .await?;
        let mut cursor = UploadCursor::new(session_id, first.len() as u64);

        loop {
            let remaining = artifact.size.saturating_sub(cursor.offset);
            let chunk = read_chunk(&mut file, remaining.min(self.chunk_size)).await?;
            if remaining <= self.chunk_size {
                session
                    .call(|client| {
                        let (cursor, chunk, path) = (cursor.clone(), chunk.clone(), path.clone());
                        async move { client.finish(&cursor, chunk, &path).await }
                    })
                    .await?;
                break;
            }
            session
                .call(|client| {
                    let (cursor, chunk) = (cursor.clone(), chunk.clone());
                    async move { client.append(&cursor, chunk).await }
                })
                .await?;
            cursor.offset += chunk.len() as u64;
        }

        info!(file = %path, bytes = artifact.size, "Uploaded file in chunks");
        Ok(())
    }
}

/// Creates `folder` remotely unless it already exists.
async fn ensure_folder(session: &mut CloudSession, folder: &str) -> AppResult<()> {
    let folder = folder.to_string();
    let lookup = session
        .call(|client| {
            let folder = folder.clone();
            async move { client.get_metadata(&folder).await }
        })
        .await;
    match lookup {
        Ok(_) => Ok(()),
        Err(CloudStorageError::NotFound(_)) => {
            session
                .call(|client| {
                    let folder = folder.clone();
                    async move { client.create_folder(&folder).await }
                })
                .await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reads exactly `len` bytes.
async fn read_chunk(file: &mut File, len: u64) -> AppResult<Bytes> {
    let mut buffer = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
    file.take(len).read_to_end(&mut buffer).await?;
    if buffer.len() as u64 != len {
        return Err(AppError::storage("File changed while it was being uploaded"));
    }
    Ok(Bytes::from(buffer))
}

fn abort(mut report: BackupReport, error: AppError) -> BackupReport {
    error!(stage = %report.stage, error = %error, "Backup run aborted");
    report.stage = BackupStage::Failed;
    report.error = Some(error.message);
    report
}
