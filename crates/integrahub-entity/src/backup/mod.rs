//! Backup run value objects.
//!
//! Nothing here is persisted: artifacts are enumerated fresh for every
//! run and the report is logged and mailed.

pub mod artifact;
pub mod report;

pub use artifact::{BackupTarget, LocalArtifact, RemoteEntry};
pub use report::{BackupReport, BackupStage, UploadFailure};
