//! Shared fakes for the service integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use integrahub_core::config::HttpConfig;
use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::traits::{JobEnqueuer, JobRequest, MailMessage, Mailer};
use integrahub_core::types::JobId;
use integrahub_database::SettingsStore;
use integrahub_database::memory::MemorySettingsStore;
use integrahub_entity::backup::RemoteEntry;
use integrahub_entity::settings::{DropboxSettings, RazorpaySettings};
use integrahub_http::HttpClient;
use integrahub_storage::DatabaseDumper;
use integrahub_storage::cloud::{
    CloudConnector, CloudStorage, CloudStorageError, RemoteMetadata, UploadCursor,
};

/// A shared HTTP client with default settings.
pub fn http_client() -> HttpClient {
    HttpClient::new(&HttpConfig::default()).expect("http client")
}

/// Writes `size` bytes of a repeating pattern to `dir/name`.
pub fn write_file(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, data).expect("write file");
    path
}

/// A call seen by [`FakeCloud`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCall {
    ListFolder(String),
    GetMetadata(String),
    CreateFolder(String),
    Upload(String, usize),
    StartSession(usize),
    Append { offset: u64, len: usize },
    Finish { offset: u64, len: usize, path: String },
}

impl CloudCall {
    /// Whether the call transfers file content.
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            Self::Upload(..) | Self::StartSession(_) | Self::Append { .. } | Self::Finish { .. }
        )
    }
}

#[derive(Debug, Default)]
struct CloudState {
    folders: HashSet<String>,
    files: HashMap<String, Vec<u8>>,
    sessions: HashMap<String, Vec<u8>>,
    calls: Vec<CloudCall>,
    /// Appends at this offset answer "expired" this many more times.
    expire_append: Option<(u64, u32)>,
    /// Every call answers "invalid token".
    invalid_token: bool,
    /// Remote paths whose upload is rejected.
    rejected: HashSet<String>,
}

/// In-memory cloud storage that assembles upload sessions byte by byte.
#[derive(Debug, Default)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
    next_session: AtomicU32,
}

impl FakeCloud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pre-creates a remote folder.
    pub async fn add_folder(&self, path: &str) {
        self.state.lock().await.folders.insert(path.to_string());
    }

    /// Pre-populates a remote file.
    pub async fn add_file(&self, path: &str, data: Vec<u8>) {
        let mut state = self.state.lock().await;
        if let Some((folder, _)) = path.rsplit_once('/') {
            state.folders.insert(folder.to_string());
        }
        state.files.insert(path.to_string(), data);
    }

    /// Makes `times` appends at `offset` fail with an expired token.
    pub async fn expire_append_at(&self, offset: u64, times: u32) {
        self.state.lock().await.expire_append = Some((offset, times));
    }

    /// Makes every call fail with an invalid token.
    pub async fn invalidate_token(&self) {
        self.state.lock().await.invalid_token = true;
    }

    /// Rejects uploads to `path`.
    pub async fn reject(&self, path: &str) {
        self.state.lock().await.rejected.insert(path.to_string());
    }

    pub async fn calls(&self) -> Vec<CloudCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    pub async fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().await.files.get(path).cloned()
    }

    pub async fn has_folder(&self, path: &str) -> bool {
        self.state.lock().await.folders.contains(path)
    }

    async fn record(&self, call: CloudCall) -> Result<(), CloudStorageError> {
        let mut state = self.state.lock().await;
        state.calls.push(call);
        if state.invalid_token {
            return Err(CloudStorageError::InvalidToken(
                "invalid_access_token".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudStorage for FakeCloud {
    async fn list_folder(&self, path: &str) -> Result<Vec<RemoteEntry>, CloudStorageError> {
        self.record(CloudCall::ListFolder(path.to_string())).await?;
        let state = self.state.lock().await;
        if !state.folders.contains(path) {
            return Err(CloudStorageError::NotFound(path.to_string()));
        }
        let prefix = format!("{path}/");
        let mut entries: Vec<RemoteEntry> = state
            .files
            .iter()
            .filter_map(|(file, data)| {
                file.strip_prefix(&prefix)
                    .filter(|name| !name.contains('/'))
                    .map(|name| RemoteEntry {
                        name: name.to_string(),
                        size: data.len() as u64,
                    })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn get_metadata(&self, path: &str) -> Result<RemoteMetadata, CloudStorageError> {
        self.record(CloudCall::GetMetadata(path.to_string())).await?;
        let state = self.state.lock().await;
        if !state.folders.contains(path) {
            return Err(CloudStorageError::NotFound(path.to_string()));
        }
        Ok(RemoteMetadata {
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            path: path.to_string(),
            is_folder: true,
            size: None,
        })
    }

    async fn create_folder(&self, path: &str) -> Result<(), CloudStorageError> {
        self.record(CloudCall::CreateFolder(path.to_string())).await?;
        self.state.lock().await.folders.insert(path.to_string());
        Ok(())
    }

    async fn upload(&self, path: &str, data: Bytes) -> Result<(), CloudStorageError> {
        self.record(CloudCall::Upload(path.to_string(), data.len()))
            .await?;
        let mut state = self.state.lock().await;
        if state.rejected.contains(path) {
            return Err(CloudStorageError::Api {
                status: 409,
                summary: "path/insufficient_space/".to_string(),
            });
        }
        state.files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn start_session(&self, first_chunk: Bytes) -> Result<String, CloudStorageError> {
        self.record(CloudCall::StartSession(first_chunk.len()))
            .await?;
        let id = format!("session-{}", self.next_session.fetch_add(1, Ordering::SeqCst));
        self.state
            .lock()
            .await
            .sessions
            .insert(id.clone(), first_chunk.to_vec());
        Ok(id)
    }

    async fn append(&self, cursor: &UploadCursor, chunk: Bytes) -> Result<(), CloudStorageError> {
        self.record(CloudCall::Append {
            offset: cursor.offset,
            len: chunk.len(),
        })
        .await?;
        let mut state = self.state.lock().await;
        if let Some((offset, remaining)) = state.expire_append {
            if offset == cursor.offset && remaining > 0 {
                state.expire_append = Some((offset, remaining - 1));
                return Err(CloudStorageError::ExpiredToken(
                    "expired_access_token".to_string(),
                ));
            }
        }
        let session = state
            .sessions
            .get_mut(&cursor.session_id)
            .ok_or_else(|| CloudStorageError::NotFound(cursor.session_id.clone()))?;
        if session.len() as u64 != cursor.offset {
            return Err(CloudStorageError::Api {
                status: 409,
                summary: format!("incorrect_offset/{}", session.len()),
            });
        }
        session.extend_from_slice(&chunk);
        Ok(())
    }

    async fn finish(
        &self,
        cursor: &UploadCursor,
        last_chunk: Bytes,
        path: &str,
    ) -> Result<(), CloudStorageError> {
        self.record(CloudCall::Finish {
            offset: cursor.offset,
            len: last_chunk.len(),
            path: path.to_string(),
        })
        .await?;
        let mut state = self.state.lock().await;
        let mut data = state
            .sessions
            .remove(&cursor.session_id)
            .ok_or_else(|| CloudStorageError::NotFound(cursor.session_id.clone()))?;
        if data.len() as u64 != cursor.offset {
            return Err(CloudStorageError::Api {
                status: 409,
                summary: format!("incorrect_offset/{}", data.len()),
            });
        }
        data.extend_from_slice(&last_chunk);
        state.files.insert(path.to_string(), data);
        Ok(())
    }
}

/// Hands out the same [`FakeCloud`] and counts renewals.
#[derive(Debug)]
pub struct FakeConnector {
    pub cloud: Arc<FakeCloud>,
    renewals: AtomicU32,
}

impl FakeConnector {
    pub fn new(cloud: Arc<FakeCloud>) -> Arc<Self> {
        Arc::new(Self {
            cloud,
            renewals: AtomicU32::new(0),
        })
    }

    pub fn renewals(&self) -> u32 {
        self.renewals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudConnector for FakeConnector {
    async fn connect(&self) -> Result<Arc<dyn CloudStorage>, CloudStorageError> {
        Ok(self.cloud.clone())
    }

    async fn renew(&self) -> Result<Arc<dyn CloudStorage>, CloudStorageError> {
        self.renewals.fetch_add(1, Ordering::SeqCst);
        Ok(self.cloud.clone())
    }
}

/// Returns the same dump file on every run.
#[derive(Debug)]
pub struct FixedDumper {
    pub path: PathBuf,
}

#[async_trait]
impl DatabaseDumper for FixedDumper {
    async fn dump(&self) -> AppResult<PathBuf> {
        Ok(self.path.clone())
    }
}

/// A dumper whose binary is broken.
#[derive(Debug)]
pub struct FailingDumper;

#[async_trait]
impl DatabaseDumper for FailingDumper {
    async fn dump(&self) -> AppResult<PathBuf> {
        Err(AppError::storage("pg_dump exited with status 1"))
    }
}

/// Keeps every message it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

/// Keeps every job it is asked to enqueue.
#[derive(Debug, Default)]
pub struct RecordingEnqueuer {
    jobs: Mutex<Vec<JobRequest>>,
}

impl RecordingEnqueuer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn jobs(&self) -> Vec<JobRequest> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl JobEnqueuer for RecordingEnqueuer {
    async fn enqueue(&self, request: JobRequest) -> AppResult<JobId> {
        self.jobs.lock().await.push(request);
        Ok(JobId::new())
    }
}

/// Reads through to a memory store; every save fails.
#[derive(Debug)]
pub struct ReadOnlySettings(pub Arc<MemorySettingsStore>);

#[async_trait]
impl SettingsStore for ReadOnlySettings {
    async fn dropbox(&self) -> AppResult<DropboxSettings> {
        self.0.dropbox().await
    }

    async fn save_dropbox(&self, _settings: &DropboxSettings) -> AppResult<()> {
        Err(AppError::database("settings table is read-only"))
    }

    async fn razorpay(&self) -> AppResult<RazorpaySettings> {
        self.0.razorpay().await
    }

    async fn save_razorpay(&self, _settings: &RazorpaySettings) -> AppResult<()> {
        Err(AppError::database("settings table is read-only"))
    }
}
