//! In-process document registry.
//!
//! Stands in for the host framework when IntegraHub runs on its own: it
//! knows which module each doctype belongs to, which documents exist, who
//! may write them, and what their hook methods return.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;

use integrahub_core::error::AppError;
use integrahub_core::result::AppResult;
use integrahub_core::traits::{DocPermission, DocumentRegistry};
use integrahub_core::types::{DocRef, Document};

use crate::context::ADMINISTRATOR;

/// A hook method invocation seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    /// Target document.
    pub doc: DocRef,
    /// Method name.
    pub method: String,
    /// Argument passed.
    pub arg: String,
}

/// Document registry held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentRegistry {
    modules: DashMap<String, String>,
    documents: DashMap<DocRef, Document>,
    writers: DashMap<DocRef, DashSet<String>>,
    password_fields: DashMap<String, Vec<String>>,
    passwords: DashMap<(DocRef, String), String>,
    method_results: DashMap<(DocRef, String), String>,
    calls: Mutex<Vec<MethodCall>>,
}

impl InMemoryDocumentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the module a doctype belongs to.
    pub fn register_module(&self, doctype: impl Into<String>, module: impl Into<String>) {
        self.modules.insert(doctype.into(), module.into());
    }

    /// Adds or replaces a document.
    pub fn insert_document(&self, document: Document) {
        self.documents.insert(document.doc_ref(), document);
    }

    /// Removes a document.
    pub fn remove_document(&self, doc: &DocRef) {
        self.documents.remove(doc);
    }

    /// Lets `user` write `doc`.
    pub fn grant_write(&self, user: impl Into<String>, doc: &DocRef) {
        self.writers
            .entry(doc.clone())
            .or_default()
            .insert(user.into());
    }

    /// Declares a password-typed field of a doctype.
    pub fn add_password_field(&self, doctype: impl Into<String>, field: impl Into<String>) {
        self.password_fields
            .entry(doctype.into())
            .or_default()
            .push(field.into());
    }

    /// Stores the decrypted value of a password field.
    pub fn set_password(&self, doc: &DocRef, field: impl Into<String>, value: impl Into<String>) {
        self.passwords
            .insert((doc.clone(), field.into()), value.into());
    }

    /// Makes `method` on `doc` return `result`.
    pub fn set_method_result(
        &self,
        doc: &DocRef,
        method: impl Into<String>,
        result: impl Into<String>,
    ) {
        self.method_results
            .insert((doc.clone(), method.into()), result.into());
    }

    /// Every hook method invoked so far.
    pub async fn method_calls(&self) -> Vec<MethodCall> {
        self.calls.lock().await.clone()
    }

    fn require(&self, doc: &DocRef) -> AppResult<()> {
        if self.documents.contains_key(doc) {
            Ok(())
        } else {
            Err(AppError::not_found(format!("{doc} not found")))
        }
    }
}

#[async_trait]
impl DocumentRegistry for InMemoryDocumentRegistry {
    async fn module_of(&self, doctype: &str) -> AppResult<String> {
        self.modules
            .get(doctype)
            .map(|module| module.value().clone())
            .ok_or_else(|| AppError::not_found(format!("DocType {doctype} not found")))
    }

    async fn exists(&self, doc: &DocRef) -> AppResult<bool> {
        Ok(self.documents.contains_key(doc))
    }

    async fn has_permission(
        &self,
        user: &str,
        doc: &DocRef,
        permission: DocPermission,
    ) -> AppResult<bool> {
        self.require(doc)?;
        Ok(match permission {
            DocPermission::Read => true,
            DocPermission::Write => {
                user == ADMINISTRATOR
                    || self
                        .writers
                        .get(doc)
                        .is_some_and(|users| users.contains(user))
            }
        })
    }

    async fn password_fields(&self, doctype: &str) -> AppResult<Vec<String>> {
        Ok(self
            .password_fields
            .get(doctype)
            .map(|fields| fields.value().clone())
            .unwrap_or_default())
    }

    async fn get_password(&self, doc: &DocRef, field: &str) -> AppResult<Option<String>> {
        Ok(self
            .passwords
            .get(&(doc.clone(), field.to_string()))
            .map(|value| value.value().clone()))
    }

    async fn run_method(
        &self,
        doc: &DocRef,
        method: &str,
        arg: &str,
    ) -> AppResult<Option<String>> {
        self.require(doc)?;
        self.calls.lock().await.push(MethodCall {
            doc: doc.clone(),
            method: method.to_string(),
            arg: arg.to_string(),
        });
        Ok(self
            .method_results
            .get(&(doc.clone(), method.to_string()))
            .map(|result| result.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use integrahub_core::error::ErrorKind;

    #[tokio::test]
    async fn test_write_permission_needs_grant() {
        let registry = InMemoryDocumentRegistry::new();
        let doc = DocRef::new("Sales Order", "SO-0001");
        registry.insert_document(Document::new("Sales Order", "SO-0001"));

        assert!(
            !registry
                .has_permission("guest@example.com", &doc, DocPermission::Write)
                .await
                .unwrap()
        );
        registry.grant_write("guest@example.com", &doc);
        assert!(
            registry
                .has_permission("guest@example.com", &doc, DocPermission::Write)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let registry = InMemoryDocumentRegistry::new();
        let err = registry
            .has_permission(
                ADMINISTRATOR,
                &DocRef::new("Sales Order", "gone"),
                DocPermission::Write,
            )
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::NotFound));
    }
}
