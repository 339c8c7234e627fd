//! Remote cloud storage used as a backup target.
//!
//! [`CloudStorage`] is the set of calls a backup run makes against one
//! authenticated client. [`CloudConnector`] hands out those clients and
//! replaces one whose token has expired.

pub mod dropbox;
pub mod error;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use integrahub_entity::backup::RemoteEntry;

pub use dropbox::{DropboxClient, DropboxConnector, DropboxCredentials, TokenGrant};
pub use error::CloudStorageError;

/// Metadata of a single remote path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMetadata {
    /// Base name.
    pub name: String,
    /// Display path.
    pub path: String,
    /// Whether the path is a folder.
    pub is_folder: bool,
    /// Size in bytes, for files.
    pub size: Option<u64>,
}

/// Position inside an open upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCursor {
    /// Provider-assigned session id.
    pub session_id: String,
    /// Bytes already accepted by the provider.
    pub offset: u64,
}

impl UploadCursor {
    /// A cursor at `offset` in `session_id`.
    pub fn new(session_id: impl Into<String>, offset: u64) -> Self {
        Self {
            session_id: session_id.into(),
            offset,
        }
    }
}

/// One authenticated connection to a cloud storage provider.
#[async_trait]
pub trait CloudStorage: Send + Sync + Debug {
    /// Files directly inside `path`, following pagination to the end.
    async fn list_folder(&self, path: &str) -> Result<Vec<RemoteEntry>, CloudStorageError>;

    /// Metadata of `path`.
    async fn get_metadata(&self, path: &str) -> Result<RemoteMetadata, CloudStorageError>;

    /// Creates the folder `path`.
    async fn create_folder(&self, path: &str) -> Result<(), CloudStorageError>;

    /// Uploads `data` to `path` in one request, overwriting.
    async fn upload(&self, path: &str, data: Bytes) -> Result<(), CloudStorageError>;

    /// Opens an upload session with its first chunk and returns the session id.
    async fn start_session(&self, first_chunk: Bytes) -> Result<String, CloudStorageError>;

    /// Appends a chunk at the cursor position.
    async fn append(&self, cursor: &UploadCursor, chunk: Bytes) -> Result<(), CloudStorageError>;

    /// Sends the last chunk and commits the session to `path`, overwriting.
    async fn finish(
        &self,
        cursor: &UploadCursor,
        last_chunk: Bytes,
        path: &str,
    ) -> Result<(), CloudStorageError>;
}

/// Source of authenticated [`CloudStorage`] clients.
#[async_trait]
pub trait CloudConnector: Send + Sync + Debug {
    /// A client for the current credentials.
    async fn connect(&self) -> Result<Arc<dyn CloudStorage>, CloudStorageError>;

    /// A replacement client after token expiry, refreshing the token when
    /// the credentials allow it.
    async fn renew(&self) -> Result<Arc<dyn CloudStorage>, CloudStorageError>;
}
