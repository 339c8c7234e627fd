//! Local content store for uploaded files.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use integrahub_core::config::StorageConfig;
use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;

const PUBLIC_URL_PREFIX: &str = "/files/";
const PRIVATE_URL_PREFIX: &str = "/private/files/";

/// Result of writing one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    /// File name actually used on disk, possibly suffixed.
    pub file_name: String,
    /// URL the file is served under.
    pub file_url: String,
    /// SHA-256 hex digest of the content.
    pub content_hash: String,
    /// Size in bytes.
    pub size: u64,
}

/// Physical storage for file record content.
#[async_trait]
pub trait ContentStore: Send + Sync + Debug + 'static {
    /// Writes content under a free name derived from `file_name`.
    async fn save(&self, file_name: &str, data: Bytes, is_private: bool)
    -> AppResult<StoredContent>;

    /// Removes the content behind a file URL. Missing content is not an error.
    async fn delete(&self, file_url: &str) -> AppResult<()>;
}

/// SHA-256 hex digest used as a file's `content_hash`.
pub fn content_hash(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Content store backed by two local directories.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    public_root: PathBuf,
    private_root: PathBuf,
}

impl LocalContentStore {
    /// Creates the store from the configured roots.
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_roots(&config.public_files_path, &config.private_files_path)
    }

    /// Creates the store from explicit roots.
    pub fn with_roots(public_root: impl Into<PathBuf>, private_root: impl Into<PathBuf>) -> Self {
        Self {
            public_root: public_root.into(),
            private_root: private_root.into(),
        }
    }

    /// Root directory of public or private files.
    pub fn root(&self, is_private: bool) -> &Path {
        if is_private {
            &self.private_root
        } else {
            &self.public_root
        }
    }

    /// Maps a file URL back to its path on disk.
    pub fn resolve(&self, file_url: &str) -> AppResult<PathBuf> {
        let (root, name) = if let Some(name) = file_url.strip_prefix(PRIVATE_URL_PREFIX) {
            (&self.private_root, name)
        } else if let Some(name) = file_url.strip_prefix(PUBLIC_URL_PREFIX) {
            (&self.public_root, name)
        } else {
            return Err(AppError::validation(format!(
                "File URL {file_url} is not served from local storage"
            )));
        };
        validate_name(name)?;
        Ok(root.join(name))
    }

    /// First of `name`, `stem-1.ext`, `stem-2.ext`, … not present in `dir`.
    async fn free_name(dir: &Path, file_name: &str) -> AppResult<String> {
        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (file_name, None),
        };
        let mut candidate = file_name.to_string();
        let mut counter = 0u32;
        while fs::try_exists(dir.join(&candidate)).await? {
            counter += 1;
            candidate = match extension {
                Some(ext) => format!("{stem}-{counter}.{ext}"),
                None => format!("{stem}-{counter}"),
            };
        }
        Ok(candidate)
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::validation(format!("Invalid file name {name}")));
    }
    Ok(())
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn save(
        &self,
        file_name: &str,
        data: Bytes,
        is_private: bool,
    ) -> AppResult<StoredContent> {
        validate_name(file_name)?;
        let dir = self.root(is_private);
        fs::create_dir_all(dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", dir.display()),
                e,
            )
        })?;

        let stored_name = Self::free_name(dir, file_name).await?;
        let path = dir.join(&stored_name);
        fs::write(&path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write file: {}", path.display()),
                e,
            )
        })?;

        let prefix = if is_private {
            PRIVATE_URL_PREFIX
        } else {
            PUBLIC_URL_PREFIX
        };
        debug!(file = %stored_name, bytes = data.len(), is_private, "Stored file content");
        Ok(StoredContent {
            file_url: format!("{prefix}{stored_name}"),
            file_name: stored_name,
            content_hash: content_hash(&data),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, file_url: &str) -> AppResult<()> {
        let path = self.resolve(file_url)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(file_url, "Deleted file content");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(file_url, "File content already gone");
                Ok(())
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {}", path.display()),
                e,
            )),
        }
    }
}
