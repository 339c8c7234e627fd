//! In-memory file/folder tree.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::types::DocRef;
use integrahub_entity::file::FileRecord;

use crate::store::FileStore;

/// File store backed by a lock-protected map.
///
/// All constraints of the `files` table (primary key, single home folder,
/// unique folder name per parent) are checked under one write lock.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    rows: RwLock<HashMap<String, FileRecord>>,
}

impl MemoryFileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn find(&self, name: &str) -> AppResult<Option<FileRecord>> {
        Ok(self.rows.read().await.get(name).cloned())
    }

    async fn find_home(&self) -> AppResult<Option<FileRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|r| r.is_home_folder)
            .cloned())
    }

    async fn find_folder(
        &self,
        parent: Option<&str>,
        file_name: &str,
    ) -> AppResult<Option<FileRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|r| r.is_folder && r.folder.as_deref() == parent && r.file_name == file_name)
            .cloned())
    }

    async fn insert(&self, record: &FileRecord) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&record.name) {
            return Err(AppError::conflict(format!(
                "File already exists ({})",
                record.name
            )));
        }
        if record.is_home_folder && rows.values().any(|r| r.is_home_folder) {
            return Err(AppError::conflict(
                "File already exists (files_single_home)",
            ));
        }
        if record.is_folder
            && rows.values().any(|r| {
                r.is_folder && r.folder == record.folder && r.file_name == record.file_name
            })
        {
            return Err(AppError::conflict(
                "File already exists (files_folder_name_unique)",
            ));
        }
        rows.insert(record.name.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> AppResult<bool> {
        Ok(self.rows.write().await.remove(name).is_some())
    }

    async fn children(&self, folder: &str) -> AppResult<Vec<FileRecord>> {
        let mut children: Vec<FileRecord> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.folder.as_deref() == Some(folder))
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            b.is_folder
                .cmp(&a.is_folder)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(children)
    }

    async fn set_size(&self, name: &str, file_size: i64) -> AppResult<()> {
        if let Some(row) = self.rows.write().await.get_mut(name) {
            row.file_size = file_size;
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_by_hash(&self, content_hash: &str) -> AppResult<Vec<FileRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.content_hash.as_deref() == Some(content_hash))
            .cloned()
            .collect())
    }

    async fn find_attached_duplicate(
        &self,
        content_hash: &str,
        attached_to: &DocRef,
        exclude: &str,
    ) -> AppResult<Option<FileRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|r| {
                r.name != exclude
                    && r.content_hash.as_deref() == Some(content_hash)
                    && r.attached_to().as_ref() == Some(attached_to)
            })
            .cloned())
    }
}
