//! Enumeration of local backup artifacts.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;
use integrahub_entity::backup::LocalArtifact;

/// OS-generated files never worth uploading.
pub const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Lists the regular files directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty listing. Subdirectories, symlinks
/// and [`IGNORED_FILES`] are skipped.
pub async fn list_artifacts(dir: &Path) -> AppResult<Vec<LocalArtifact>> {
    if !fs::try_exists(dir).await? {
        debug!(dir = %dir.display(), "Backup source directory missing");
        return Ok(Vec::new());
    }

    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to list directory: {}", dir.display()),
            e,
        )
    })?;

    let mut artifacts = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
    })? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if IGNORED_FILES.contains(&name.as_str()) {
            continue;
        }
        let file_type = entry.file_type().await?;
        if !file_type.is_file() {
            continue;
        }
        let metadata = entry.metadata().await?;
        artifacts.push(LocalArtifact {
            name,
            path: entry.path(),
            size: metadata.len(),
        });
    }

    artifacts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(artifacts)
}
