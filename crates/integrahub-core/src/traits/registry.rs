//! Access to the host framework's documents and permission model.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::DocRef;

/// Permission types checked on referenced documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocPermission {
    /// Read access.
    Read,
    /// Write access.
    Write,
}

/// Resolves tagged document references to the framework that owns them.
#[async_trait]
pub trait DocumentRegistry: Send + Sync + std::fmt::Debug + 'static {
    /// The module a doctype belongs to.
    async fn module_of(&self, doctype: &str) -> AppResult<String>;

    /// Whether the referenced document still exists.
    async fn exists(&self, doc: &DocRef) -> AppResult<bool>;

    /// Whether `user` holds `permission` on `doc`.
    ///
    /// Returns an error of kind `NotFound` when the document is gone.
    async fn has_permission(
        &self,
        user: &str,
        doc: &DocRef,
        permission: DocPermission,
    ) -> AppResult<bool>;

    /// Names of the password-typed fields on a doctype.
    async fn password_fields(&self, doctype: &str) -> AppResult<Vec<String>>;

    /// The decrypted value of a password field, if one is stored.
    async fn get_password(&self, doc: &DocRef, field: &str) -> AppResult<Option<String>>;

    /// Invokes a named hook on a document.
    ///
    /// Returns the hook's string result, or `None` when the document does
    /// not define the hook or it returned nothing.
    async fn run_method(
        &self,
        doc: &DocRef,
        method: &str,
        arg: &str,
    ) -> AppResult<Option<String>>;
}
