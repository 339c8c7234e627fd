//! # integrahub-storage
//!
//! Where bytes live: the local public/private file roots, the remote cloud
//! storage targeted by backups, and the database dumps fed into them.

pub mod artifacts;
pub mod cloud;
pub mod content;
pub mod dump;

pub use artifacts::list_artifacts;
pub use content::{ContentStore, LocalContentStore, StoredContent, content_hash};
pub use dump::{DatabaseDumper, PgDumpDumper};
