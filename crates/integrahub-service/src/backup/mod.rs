//! Scheduled backups of the database and file roots to cloud storage.

pub mod notify;
pub mod service;
pub mod session;
pub mod uploader;

pub use service::DropboxBackupService;
pub use session::{CloudSession, RetryState};
pub use uploader::{BackupUploader, DATABASE_FOLDER, PRIVATE_FILES_FOLDER, PUBLIC_FILES_FOLDER};
