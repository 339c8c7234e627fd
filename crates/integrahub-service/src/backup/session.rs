//! The cloud session shared by every upload of one backup run.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use integrahub_storage::cloud::{CloudConnector, CloudStorage, CloudStorageError};

/// How many session renewals a run has used and may use.
///
/// Immutable: a renewal yields a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Renewals performed so far.
    pub renewals: u32,
    /// Renewals allowed in total.
    pub max_renewals: u32,
}

impl RetryState {
    /// A fresh budget of `max_renewals`.
    pub fn new(max_renewals: u32) -> Self {
        Self {
            renewals: 0,
            max_renewals,
        }
    }

    /// Whether another renewal is allowed.
    pub fn can_renew(&self) -> bool {
        self.renewals < self.max_renewals
    }

    /// The state after one more renewal.
    #[must_use]
    pub fn renewed(self) -> Self {
        Self {
            renewals: self.renewals + 1,
            ..self
        }
    }
}

/// One authenticated client plus the run's renewal budget.
///
/// Uploads run sequentially through a single session because renewing the
/// token invalidates any other in-flight session.
#[derive(Debug)]
pub struct CloudSession {
    connector: Arc<dyn CloudConnector>,
    client: Arc<dyn CloudStorage>,
    retry: RetryState,
}

impl CloudSession {
    /// Connects with a budget of `max_renewals`.
    pub async fn open(
        connector: Arc<dyn CloudConnector>,
        max_renewals: u32,
    ) -> Result<Self, CloudStorageError> {
        let client = connector.connect().await?;
        Ok(Self {
            connector,
            client,
            retry: RetryState::new(max_renewals),
        })
    }

    /// Current renewal state.
    pub fn retry_state(&self) -> RetryState {
        self.retry
    }

    /// Runs `op` against the client, renewing the session and repeating the
    /// same call whenever the token has expired.
    ///
    /// Once the budget is spent the expiry error is returned. Any other
    /// error, including an invalid token, is returned at once.
    pub async fn call<T, F, Fut>(&mut self, mut op: F) -> Result<T, CloudStorageError>
    where
        F: FnMut(Arc<dyn CloudStorage>) -> Fut,
        Fut: Future<Output = Result<T, CloudStorageError>>,
    {
        loop {
            match op(Arc::clone(&self.client)).await {
                Err(e) if e.is_expired_token() => self.renew(e).await?,
                other => return other,
            }
        }
    }

    async fn renew(&mut self, cause: CloudStorageError) -> Result<(), CloudStorageError> {
        if !self.retry.can_renew() {
            warn!(
                renewals = self.retry.renewals,
                error = %cause,
                "Cloud session renewal budget exhausted"
            );
            return Err(cause);
        }
        self.client = self.connector.renew().await?;
        self.retry = self.retry.renewed();
        info!(
            renewals = self.retry.renewals,
            max_renewals = self.retry.max_renewals,
            "Cloud session renewed after token expiry"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_allows_exactly_max_renewals() {
        let mut state = RetryState::new(3);
        let mut renewed = 0;
        while state.can_renew() {
            state = state.renewed();
            renewed += 1;
        }
        assert_eq!(renewed, 3);
        assert_eq!(state.renewals, 3);
    }

    #[test]
    fn test_renewed_leaves_original_untouched() {
        let state = RetryState::new(10);
        let next = state.renewed();
        assert_eq!(state.renewals, 0);
        assert_eq!(next.renewals, 1);
        assert_eq!(next.max_renewals, 10);
    }
}
