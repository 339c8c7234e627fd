//! File/folder tree repository.

use async_trait::async_trait;
use sqlx::PgPool;

use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;
use integrahub_core::types::DocRef;
use integrahub_entity::file::FileRecord;

use super::map_insert_error;
use crate::store::FileStore;

/// Repository for the `files` table.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn find(&self, name: &str) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    async fn find_home(&self) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE is_home_folder LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find home folder", e)
            })
    }

    async fn find_folder(
        &self,
        parent: Option<&str>,
        file_name: &str,
    ) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files WHERE is_folder AND folder IS NOT DISTINCT FROM $1 \
             AND file_name = $2",
        )
        .bind(parent)
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    async fn insert(&self, record: &FileRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO files (name, file_name, is_folder, is_home_folder, folder, file_url, \
             is_private, content_hash, file_size, attached_to_doctype, attached_to_name, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(&record.name)
        .bind(&record.file_name)
        .bind(record.is_folder)
        .bind(record.is_home_folder)
        .bind(&record.folder)
        .bind(&record.file_url)
        .bind(record.is_private)
        .bind(&record.content_hash)
        .bind(record.file_size)
        .bind(&record.attached_to_doctype)
        .bind(&record.attached_to_name)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "File"))?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn children(&self, folder: &str) -> AppResult<Vec<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files WHERE folder = $1 ORDER BY is_folder DESC, file_name ASC",
        )
        .bind(folder)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn set_size(&self, name: &str, file_size: i64) -> AppResult<()> {
        sqlx::query("UPDATE files SET file_size = $2, updated_at = NOW() WHERE name = $1")
            .bind(name)
            .bind(file_size)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update folder size", e)
            })?;
        Ok(())
    }

    async fn find_by_hash(&self, content_hash: &str) -> AppResult<Vec<FileRecord>> {
        sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE content_hash = $1")
            .bind(content_hash)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find files by hash", e)
            })
    }

    async fn find_attached_duplicate(
        &self,
        content_hash: &str,
        attached_to: &DocRef,
        exclude: &str,
    ) -> AppResult<Option<FileRecord>> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT * FROM files WHERE content_hash = $1 AND attached_to_doctype = $2 \
             AND attached_to_name = $3 AND name <> $4 LIMIT 1",
        )
        .bind(content_hash)
        .bind(&attached_to.doctype)
        .bind(&attached_to.name)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check duplicate attachment", e)
        })
    }
}
