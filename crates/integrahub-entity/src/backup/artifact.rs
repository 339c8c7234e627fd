//! Local and remote file listings compared during a backup run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A local file eligible for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalArtifact {
    /// Base file name.
    pub name: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// A file already present in the remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Base file name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

impl LocalArtifact {
    /// Whether the remote listing already holds this exact file.
    pub fn is_uploaded(&self, remote: &[RemoteEntry]) -> bool {
        remote
            .iter()
            .any(|entry| entry.name == self.name && entry.size == self.size)
    }
}

/// A local directory mirrored into a remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupTarget {
    /// Local source directory.
    pub local_dir: PathBuf,
    /// Remote destination folder, e.g. `/files`.
    pub remote_folder: String,
}

impl BackupTarget {
    /// Creates a target.
    pub fn new(local_dir: impl Into<PathBuf>, remote_folder: impl Into<String>) -> Self {
        Self {
            local_dir: local_dir.into(),
            remote_folder: remote_folder.into(),
        }
    }

    /// Remote path for a file inside this target.
    pub fn remote_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.remote_folder.trim_end_matches('/'), file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_uploaded_requires_name_and_size() {
        let local = LocalArtifact {
            name: "logo.png".to_string(),
            path: PathBuf::from("/srv/files/logo.png"),
            size: 2048,
        };
        let same_name_other_size = vec![RemoteEntry {
            name: "logo.png".to_string(),
            size: 2047,
        }];
        let exact = vec![RemoteEntry {
            name: "logo.png".to_string(),
            size: 2048,
        }];
        assert!(!local.is_uploaded(&same_name_other_size));
        assert!(local.is_uploaded(&exact));
        assert!(!local.is_uploaded(&[]));
    }
}
