//! File/folder node model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use integrahub_core::types::DocRef;

/// Name (and file name) of the single root folder.
pub const HOME_FOLDER: &str = "Home";

/// A node in the file tree: either a stored file or a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    /// Record identifier. Folders use their path (`Home/Selling`).
    pub name: String,
    /// Display file name.
    pub file_name: String,
    /// Whether this node is a folder.
    pub is_folder: bool,
    /// Whether this node is the root of the tree.
    pub is_home_folder: bool,
    /// Parent folder name; `None` only for the home folder.
    pub folder: Option<String>,
    /// Public or private URL of the stored content.
    pub file_url: Option<String>,
    /// Whether the content lives under the private root.
    pub is_private: bool,
    /// SHA-256 of the content, hex encoded.
    pub content_hash: Option<String>,
    /// Size in bytes; for folders the sum of direct children.
    pub file_size: i64,
    /// Doctype of the document this file is attached to.
    pub attached_to_doctype: Option<String>,
    /// Name of the document this file is attached to.
    pub attached_to_name: Option<String>,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// The attached document, if both halves of the reference are set.
    pub fn attached_to(&self) -> Option<DocRef> {
        DocRef::from_parts(
            self.attached_to_doctype.as_deref(),
            self.attached_to_name.as_deref(),
        )
    }

    /// Record name of a folder called `file_name` under `parent`.
    pub fn folder_path(parent: Option<&str>, file_name: &str) -> String {
        match parent {
            Some(parent) => format!("{parent}/{file_name}"),
            None => file_name.to_string(),
        }
    }
}

/// Data required to create a file or folder node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFile {
    /// Explicit record name; generated when `None`.
    pub name: Option<String>,
    /// Display file name.
    pub file_name: String,
    /// Whether this node is a folder.
    pub is_folder: bool,
    /// Whether this node is the root of the tree.
    pub is_home_folder: bool,
    /// Parent folder name.
    pub folder: Option<String>,
    /// URL of the stored content.
    pub file_url: Option<String>,
    /// Whether the content lives under the private root.
    pub is_private: bool,
    /// SHA-256 of the content.
    pub content_hash: Option<String>,
    /// Size in bytes.
    pub file_size: i64,
    /// The document this file is attached to.
    pub attached_to: Option<DocRef>,
}

impl NewFile {
    /// A folder node named `file_name` under `parent`.
    pub fn folder(file_name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            file_name: file_name.into(),
            is_folder: true,
            folder: parent,
            ..Self::default()
        }
    }

    /// Materializes the row with the given record name.
    pub fn into_record(self, name: String, now: DateTime<Utc>) -> FileRecord {
        let (attached_to_doctype, attached_to_name) = match self.attached_to {
            Some(doc) => (Some(doc.doctype), Some(doc.name)),
            None => (None, None),
        };
        FileRecord {
            name,
            file_name: self.file_name,
            is_folder: self.is_folder,
            is_home_folder: self.is_home_folder,
            folder: self.folder,
            file_url: self.file_url,
            is_private: self.is_private,
            content_hash: self.content_hash,
            file_size: if self.is_folder { 0 } else { self.file_size },
            attached_to_doctype,
            attached_to_name,
            created_at: now,
            updated_at: now,
        }
    }
}
