//! File and folder tree management.

pub mod manager;

pub use manager::{FileManager, UploadFile};
