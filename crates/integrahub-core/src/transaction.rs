//! Compensating actions tied to an enclosing unit of work.
//!
//! Operations that create durable side effects register an undo step on
//! the scope. If the caller aborts, [`TransactionScope::rollback`] runs the
//! steps newest-first; on success [`TransactionScope::commit`] drops them.

use std::sync::Mutex;

use futures::future::BoxFuture;
use tracing::{debug, error};

use crate::result::AppResult;

/// A boxed compensating action.
pub type CompensatingAction = Box<dyn FnOnce() -> BoxFuture<'static, AppResult<()>> + Send>;

struct Entry {
    label: String,
    action: CompensatingAction,
}

/// Collects compensating actions for one unit of work.
#[derive(Default)]
pub struct TransactionScope {
    entries: Mutex<Vec<Entry>>,
}

impl std::fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("pending", &self.pending())
            .finish()
    }
}

impl TransactionScope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action to run if the scope is rolled back.
    pub fn register<F>(&self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> BoxFuture<'static, AppResult<()>> + Send + 'static,
    {
        let label = label.into();
        debug!(action = %label, "Compensating action registered");
        self.lock().push(Entry {
            label,
            action: Box::new(action),
        });
    }

    /// Number of registered actions.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Discards all registered actions.
    pub fn commit(self) {
        let count = self.pending();
        debug!(count, "Transaction scope committed");
    }

    /// Runs every registered action in reverse registration order.
    ///
    /// Failures are logged and do not stop the remaining actions. Returns
    /// the number of actions that failed.
    pub async fn rollback(self) -> usize {
        let entries = std::mem::take(&mut *self.lock());
        let mut failed = 0;
        for entry in entries.into_iter().rev() {
            if let Err(e) = (entry.action)().await {
                failed += 1;
                error!(action = %entry.label, error = %e, "Compensating action failed");
            }
        }
        failed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
