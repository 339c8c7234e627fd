//! File tree maintenance over the in-memory store and a temp content root.

use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use integrahub_core::error::ErrorKind;
use integrahub_core::transaction::TransactionScope;
use integrahub_core::types::{DocRef, Document};
use integrahub_database::memory::MemoryFileStore;
use integrahub_entity::file::{HOME_FOLDER, NewFile};
use integrahub_storage::{ContentStore, LocalContentStore};
use integrahub_service::{FileManager, InMemoryDocumentRegistry, RequestContext, UploadFile};

struct Harness {
    _root: TempDir,
    content: Arc<LocalContentStore>,
    registry: Arc<InMemoryDocumentRegistry>,
    manager: FileManager,
}

impl Harness {
    fn new() -> Self {
        let root = TempDir::new().expect("tempdir");
        let content = Arc::new(LocalContentStore::with_roots(
            root.path().join("public"),
            root.path().join("private"),
        ));
        let registry = Arc::new(InMemoryDocumentRegistry::new());
        registry.register_module("Sales Order", "Selling");
        registry.insert_document(Document::new("Sales Order", "SO-0001"));
        let manager = FileManager::new(
            Arc::new(MemoryFileStore::new()),
            content.clone(),
            registry.clone(),
        );
        Self {
            _root: root,
            content,
            registry,
            manager,
        }
    }

    async fn attach(&self, scope: &TransactionScope, name: &str, data: &'static [u8]) -> String {
        self.manager
            .upload(
                &RequestContext::system(),
                scope,
                UploadFile {
                    file_name: name.to_string(),
                    content: Bytes::from_static(data),
                    is_private: false,
                    folder: None,
                    attached_to: Some(order()),
                },
            )
            .await
            .expect("upload")
            .name
    }

    async fn size_of(&self, name: &str) -> i64 {
        self.manager.get(name).await.expect("record").file_size
    }

    fn exists(&self, file_url: &str) -> bool {
        self.content.resolve(file_url).expect("resolve").exists()
    }
}

fn order() -> DocRef {
    DocRef::new("Sales Order", "SO-0001")
}

#[tokio::test]
async fn test_attachment_lands_in_module_folder_and_sizes_roll_up() {
    let h = Harness::new();
    let scope = TransactionScope::new();

    let first = h.attach(&scope, "quote.pdf", b"0123456789").await;
    h.attach(&scope, "terms.txt", b"abcde").await;

    let record = h.manager.get(&first).await.unwrap();
    assert_eq!(record.folder.as_deref(), Some("Home/Selling/Sales Order"));
    assert_eq!(h.size_of("Home/Selling/Sales Order").await, 15);
    assert_eq!(h.size_of("Home/Selling").await, 15);
    assert_eq!(h.size_of(HOME_FOLDER).await, 15);

    let crumbs: Vec<String> = h
        .manager
        .get_breadcrumbs("Home/Selling/Sales Order")
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(crumbs, ["Home", "Home/Selling", "Home/Selling/Sales Order"]);
}

#[tokio::test]
async fn test_same_content_on_same_document_is_rejected() {
    let h = Harness::new();
    let scope = TransactionScope::new();
    let first = h.attach(&scope, "quote.pdf", b"same bytes").await;

    let err = h
        .manager
        .upload(
            &RequestContext::system(),
            &scope,
            UploadFile {
                file_name: "copy.pdf".to_string(),
                content: Bytes::from_static(b"same bytes"),
                is_private: false,
                folder: None,
                attached_to: Some(order()),
            },
        )
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::DuplicateEntry));
    assert_eq!(
        err.message,
        format!("Same file has already been attached to the record: {first}")
    );
    assert!(!h.exists("/files/copy.pdf"));
}

#[tokio::test]
async fn test_missing_folder_is_rejected() {
    let h = Harness::new();
    let err = h
        .manager
        .insert(
            &RequestContext::system(),
            &TransactionScope::new(),
            NewFile {
                file_name: "orphan.txt".to_string(),
                folder: Some("Home/Nowhere".to_string()),
                ..NewFile::default()
            },
        )
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::Validation));
    assert_eq!(err.message, "Folder Home/Nowhere does not exist");
}

#[tokio::test]
async fn test_non_empty_folder_and_home_cannot_be_deleted() {
    let h = Harness::new();
    h.attach(&TransactionScope::new(), "quote.pdf", b"data").await;

    let err = h
        .manager
        .delete("Administrator", "Home/Selling", false)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Folder Home/Selling is not empty");

    let err = h
        .manager
        .delete("Administrator", HOME_FOLDER, true)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Validation));

    h.manager
        .delete("Administrator", "Home/missing", false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_needs_write_on_existing_document() {
    let h = Harness::new();
    let name = h.attach(&TransactionScope::new(), "quote.pdf", b"data").await;

    let err = h
        .manager
        .delete("guest@example.com", &name, false)
        .await
        .unwrap_err();
    assert!(err.is(ErrorKind::Permission));

    h.registry.remove_document(&order());
    h.manager
        .delete("guest@example.com", &name, false)
        .await
        .unwrap();
    assert!(h.manager.get(&name).await.unwrap_err().is(ErrorKind::NotFound));
    assert_eq!(h.size_of("Home/Selling/Sales Order").await, 0);
}

#[tokio::test]
async fn test_rollback_removes_record_and_content() {
    let h = Harness::new();
    let scope = TransactionScope::new();
    let name = h.attach(&scope, "quote.pdf", b"0123456789").await;
    let file_url = h.manager.get(&name).await.unwrap().file_url.unwrap();
    assert!(h.exists(&file_url));

    let failed = scope.rollback().await;

    assert_eq!(failed, 0);
    assert!(h.manager.get(&name).await.unwrap_err().is(ErrorKind::NotFound));
    assert!(!h.exists(&file_url));
    assert_eq!(h.size_of(HOME_FOLDER).await, 0);
}

#[tokio::test]
async fn test_same_bytes_uploaded_twice_share_one_stored_file() {
    let h = Harness::new();
    h.registry
        .insert_document(Document::new("Sales Order", "SO-0002"));
    let scope = TransactionScope::new();
    let mut records = Vec::new();
    for order_name in ["SO-0001", "SO-0002"] {
        let record = h
            .manager
            .upload(
                &RequestContext::system(),
                &scope,
                UploadFile {
                    file_name: "logo.png".to_string(),
                    content: Bytes::from_static(b"samebytes"),
                    is_private: false,
                    folder: None,
                    attached_to: Some(DocRef::new("Sales Order", order_name)),
                },
            )
            .await
            .unwrap();
        records.push(record);
    }
    let file_url = records[0].file_url.clone().unwrap();
    assert_eq!(records[1].file_url.as_deref(), Some(file_url.as_str()));
    assert!(!h.exists("/files/logo-1.png"));

    h.manager
        .delete("Administrator", &records[0].name, false)
        .await
        .unwrap();
    assert!(h.exists(&file_url));

    h.manager
        .delete("Administrator", &records[1].name, false)
        .await
        .unwrap();
    assert!(!h.exists(&file_url));
}

#[tokio::test]
async fn test_shared_content_survives_until_last_record() {
    let h = Harness::new();
    let scope = TransactionScope::new();
    let stored = h
        .content
        .save("logo.png", Bytes::from_static(b"png"), false)
        .await
        .unwrap();
    let home = h.manager.make_home_folder().await.unwrap();
    let mut names = Vec::new();
    for _ in 0..2 {
        let record = h
            .manager
            .insert(
                &RequestContext::system(),
                &scope,
                NewFile {
                    file_name: stored.file_name.clone(),
                    file_url: Some(stored.file_url.clone()),
                    content_hash: Some(stored.content_hash.clone()),
                    file_size: 3,
                    folder: Some(home.name.clone()),
                    ..NewFile::default()
                },
            )
            .await
            .unwrap();
        names.push(record.name);
    }
    assert_eq!(h.size_of(HOME_FOLDER).await, 6);

    h.manager.delete("Administrator", &names[0], false).await.unwrap();
    assert!(h.exists(&stored.file_url));

    h.manager.delete("Administrator", &names[1], false).await.unwrap();
    assert!(!h.exists(&stored.file_url));
}
