//! File/folder insert, validation and deletion.
//!
//! Folder records are named by their path from the home folder
//! (`Home/Selling/Sales Order`); file records get a generated name.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use integrahub_core::error::{AppError, ErrorKind};
use integrahub_core::result::AppResult;
use integrahub_core::traits::{DocPermission, DocumentRegistry};
use integrahub_core::transaction::TransactionScope;
use integrahub_core::types::DocRef;
use integrahub_database::FileStore;
use integrahub_entity::file::{FileRecord, HOME_FOLDER, NewFile};
use integrahub_storage::{ContentStore, content_hash};

use crate::context::RequestContext;

/// An uploaded file waiting to be stored.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Requested file name.
    pub file_name: String,
    /// Raw content.
    pub content: Bytes,
    /// Store under the private root.
    pub is_private: bool,
    /// Target folder; derived from the attachment when absent.
    pub folder: Option<String>,
    /// Document the file is attached to.
    pub attached_to: Option<DocRef>,
}

/// Maintains the file/folder tree.
#[derive(Debug, Clone)]
pub struct FileManager {
    /// File records.
    files: Arc<dyn FileStore>,
    /// Physical content.
    content: Arc<dyn ContentStore>,
    /// Host documents and permissions.
    registry: Arc<dyn DocumentRegistry>,
}

impl FileManager {
    /// Creates a new file manager.
    pub fn new(
        files: Arc<dyn FileStore>,
        content: Arc<dyn ContentStore>,
        registry: Arc<dyn DocumentRegistry>,
    ) -> Self {
        Self {
            files,
            content,
            registry,
        }
    }

    /// Loads a record.
    pub async fn get(&self, name: &str) -> AppResult<FileRecord> {
        self.files
            .find(name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {name} not found")))
    }

    /// Direct children of a folder.
    pub async fn children(&self, folder: &str) -> AppResult<Vec<FileRecord>> {
        self.files.children(folder).await
    }

    /// Returns the home folder, creating it on first use.
    pub async fn make_home_folder(&self) -> AppResult<FileRecord> {
        if let Some(home) = self.files.find_home().await? {
            return Ok(home);
        }
        let record = NewFile {
            is_home_folder: true,
            ..NewFile::folder(HOME_FOLDER, None)
        }
        .into_record(HOME_FOLDER.to_string(), Utc::now());

        match self.files.insert(&record).await {
            Ok(()) => {
                info!(folder = %record.name, "Home folder created");
                Ok(record)
            }
            Err(e) if e.is(ErrorKind::Conflict) => self
                .files
                .find_home()
                .await?
                .ok_or_else(|| AppError::internal("Home folder vanished after conflict")),
            Err(e) => Err(e),
        }
    }

    /// Returns the folder `file_name` under `parent`, creating it if missing.
    ///
    /// Concurrent callers race on the unique (parent, name) constraint; the
    /// loser re-reads the winner's record.
    pub async fn get_or_create_folder(
        &self,
        file_name: &str,
        parent: Option<&str>,
    ) -> AppResult<FileRecord> {
        if let Some(folder) = self.files.find_folder(parent, file_name).await? {
            return Ok(folder);
        }
        let name = FileRecord::folder_path(parent, file_name);
        let record = NewFile::folder(file_name, parent.map(str::to_string))
            .into_record(name, Utc::now());

        match self.files.insert(&record).await {
            Ok(()) => {
                info!(folder = %record.name, "Folder created");
                Ok(record)
            }
            Err(e) if e.is(ErrorKind::Conflict) => {
                debug!(folder = %record.name, "Folder created concurrently");
                self.files
                    .find_folder(parent, file_name)
                    .await?
                    .ok_or_else(|| {
                        AppError::internal(format!(
                            "Folder {} vanished after conflict",
                            record.name
                        ))
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Checks a record about to be inserted as `name`.
    pub async fn validate(&self, file: &NewFile, name: &str) -> AppResult<()> {
        if !file.is_home_folder {
            let Some(folder) = file.folder.as_deref() else {
                return Err(AppError::validation("Folder is mandatory"));
            };
            match self.files.find(folder).await? {
                Some(parent) if parent.is_folder => {}
                _ => {
                    return Err(AppError::validation(format!(
                        "Folder {folder} does not exist"
                    )));
                }
            }
        }

        let (Some(hash), Some(target)) = (file.content_hash.as_deref(), &file.attached_to) else {
            return Ok(());
        };
        if let Some(existing) = self
            .files
            .find_attached_duplicate(hash, target, name)
            .await?
        {
            return Err(AppError::duplicate_entry(format!(
                "Same file has already been attached to the record: {}",
                existing.name
            )));
        }
        Ok(())
    }

    /// Inserts a file or folder record.
    ///
    /// An attached file without a folder lands in `Home/<module>/<doctype>`.
    /// Ancestor folder sizes are recomputed afterwards, and a compensating
    /// delete is registered on `scope`.
    pub async fn insert(
        &self,
        ctx: &RequestContext,
        scope: &TransactionScope,
        mut file: NewFile,
    ) -> AppResult<FileRecord> {
        let needs_folder = !file.is_folder && file.folder.is_none();
        if let Some(target) = file.attached_to.as_ref().filter(|_| needs_folder) {
            let doctype = target.doctype.clone();
            file.folder = Some(self.attachment_folder(&doctype).await?);
        }

        let name = if file.is_home_folder {
            HOME_FOLDER.to_string()
        } else if file.is_folder {
            FileRecord::folder_path(file.folder.as_deref(), &file.file_name)
        } else {
            file.name
                .clone()
                .unwrap_or_else(|| Uuid::now_v7().to_string())
        };

        self.validate(&file, &name).await?;

        let record = file.into_record(name, Utc::now());
        self.files.insert(&record).await?;
        if let Some(parent) = record.folder.as_deref() {
            self.recompute_sizes(parent).await?;
        }

        let manager = self.clone();
        let user = ctx.user.clone();
        let undo_name = record.name.clone();
        scope.register(format!("delete file {}", record.name), move || {
            async move { manager.delete(&user, &undo_name, true).await }.boxed()
        });

        info!(
            user = %ctx.user,
            file = %record.name,
            folder = ?record.folder,
            is_folder = record.is_folder,
            size = record.file_size,
            "File record inserted"
        );
        Ok(record)
    }

    /// Stores uploaded content and inserts its record.
    ///
    /// Content already stored under the same hash and privacy is reused
    /// instead of written again. Content written for an insert that then
    /// fails is removed again.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        scope: &TransactionScope,
        upload: UploadFile,
    ) -> AppResult<FileRecord> {
        let hash = content_hash(&upload.content);
        let size = i64::try_from(upload.content.len())
            .map_err(|_| AppError::validation("File is too large"))?;
        let existing_url = self
            .files
            .find_by_hash(&hash)
            .await?
            .into_iter()
            .filter(|f| !f.is_folder && f.is_private == upload.is_private)
            .find_map(|f| f.file_url);

        let (file_name, file_url, written) = match existing_url {
            Some(file_url) => {
                debug!(file_url = %file_url, "Reusing stored content with the same hash");
                (upload.file_name, file_url, false)
            }
            None => {
                let stored = self
                    .content
                    .save(&upload.file_name, upload.content, upload.is_private)
                    .await?;
                (stored.file_name, stored.file_url, true)
            }
        };

        let file = NewFile {
            file_name,
            file_url: Some(file_url.clone()),
            is_private: upload.is_private,
            content_hash: Some(hash),
            file_size: size,
            folder: upload.folder,
            attached_to: upload.attached_to,
            ..NewFile::default()
        };

        match self.insert(ctx, scope, file).await {
            Ok(record) => Ok(record),
            Err(e) => {
                if written {
                    if let Err(cleanup) = self.content.delete(&file_url).await {
                        warn!(
                            file_url = %file_url,
                            error = %cleanup,
                            "Failed to remove orphaned upload"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Deletes a record. Missing records are ignored.
    ///
    /// Folders must be empty. Unless `ignore_permissions`, `user` needs write
    /// permission on the attached document, if that document still exists.
    /// Content is removed only when no other record points at the same
    /// stored file.
    pub async fn delete(&self, user: &str, name: &str, ignore_permissions: bool) -> AppResult<()> {
        let Some(record) = self.files.find(name).await? else {
            debug!(file = %name, "File already deleted");
            return Ok(());
        };

        if record.is_home_folder {
            return Err(AppError::validation("Home folder can not be deleted"));
        }
        if record.is_folder && !self.files.children(&record.name).await?.is_empty() {
            return Err(AppError::validation(format!(
                "Folder {} is not empty",
                record.name
            )));
        }
        if !ignore_permissions {
            self.check_write_permission(user, &record).await?;
        }

        self.files.delete(&record.name).await?;
        self.delete_content(&record).await?;
        if let Some(parent) = record.folder.as_deref() {
            self.recompute_sizes(parent).await?;
        }

        info!(user, file = %record.name, "File record deleted");
        Ok(())
    }

    /// Ancestor chain of `folder`, home folder first.
    pub async fn get_breadcrumbs(&self, folder: &str) -> AppResult<Vec<FileRecord>> {
        let mut chain = Vec::new();
        let mut current = Some(folder.to_string());
        while let Some(name) = current {
            let record = self.get(&name).await?;
            current = record.folder.clone();
            chain.push(record);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Sets each folder's size to the sum of its direct children, walking
    /// from `folder` up to the root.
    pub async fn recompute_sizes(&self, folder: &str) -> AppResult<()> {
        let mut current = Some(folder.to_string());
        while let Some(name) = current {
            let total: i64 = self
                .files
                .children(&name)
                .await?
                .iter()
                .map(|child| child.file_size)
                .sum();
            self.files.set_size(&name, total).await?;
            debug!(folder = %name, size = total, "Folder size recomputed");
            current = self.files.find(&name).await?.and_then(|f| f.folder);
        }
        Ok(())
    }

    async fn attachment_folder(&self, doctype: &str) -> AppResult<String> {
        let home = self.make_home_folder().await?;
        let module = self.registry.module_of(doctype).await?;
        let module_folder = self.get_or_create_folder(&module, Some(&home.name)).await?;
        let doctype_folder = self
            .get_or_create_folder(doctype, Some(&module_folder.name))
            .await?;
        Ok(doctype_folder.name)
    }

    async fn check_write_permission(&self, user: &str, record: &FileRecord) -> AppResult<()> {
        let Some(target) = record.attached_to() else {
            return Ok(());
        };
        match self
            .registry
            .has_permission(user, &target, DocPermission::Write)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(user, file = %record.name, document = %target, "Delete denied");
                Err(AppError::permission("No permission to write / remove."))
            }
            Err(e) if e.is(ErrorKind::NotFound) => {
                debug!(file = %record.name, document = %target, "Attached document is gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_content(&self, record: &FileRecord) -> AppResult<()> {
        let Some(file_url) = record.file_url.as_deref() else {
            return Ok(());
        };
        if let Some(hash) = record.content_hash.as_deref() {
            let shared = self
                .files
                .find_by_hash(hash)
                .await?
                .into_iter()
                .any(|other| {
                    other.name != record.name && other.file_url.as_deref() == Some(file_url)
                });
            if shared {
                debug!(file = %record.name, "Content shared with another record, kept");
                return Ok(());
            }
        }
        self.content.delete(file_url).await
    }
}
