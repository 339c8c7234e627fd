//! Outcome of a backup run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a backup run currently is, or where it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStage {
    /// Not started.
    Idle,
    /// Producing the database dump and enumerating file roots.
    Dumping,
    /// Comparing local artifacts against remote listings.
    Diffing,
    /// Transferring pending files.
    Uploading,
    /// Every pending file was uploaded.
    Done,
    /// At least one file failed, or the run aborted.
    Failed,
}

impl fmt::Display for BackupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Dumping => "dumping",
            Self::Diffing => "diffing",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A file that could not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    /// Local path of the file.
    pub file_name: String,
    /// Error text.
    pub error: String,
}

/// Summary of one backup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    /// Final stage: `Done` or `Failed`.
    pub stage: BackupStage,
    /// Remote paths that were uploaded.
    pub uploaded: Vec<String>,
    /// Files that did not upload.
    pub failures: Vec<UploadFailure>,
    /// Run-level error that aborted the run, if any.
    pub error: Option<String>,
}

impl BackupReport {
    /// A report for a run that never got going.
    pub fn aborted(error: impl Into<String>) -> Self {
        Self {
            stage: BackupStage::Failed,
            uploaded: Vec::new(),
            failures: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        self.stage == BackupStage::Done
    }

    /// `file - error` lines for the failure notification.
    pub fn failure_lines(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("{} - {}", f.file_name, f.error))
            .collect()
    }
}
