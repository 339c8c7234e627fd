//! Job handlers for the integrations.

pub mod backup;
pub mod payment;
pub mod webhook;

pub use backup::BackupJobHandler;
pub use payment::PaymentCaptureJobHandler;
pub use webhook::WebhookJobHandler;

use integrahub_core::error::{AppError, ErrorKind};

use crate::executor::JobExecutionError;

/// Store and remote-service outages may clear up; everything else will not.
pub(crate) fn classify(err: AppError) -> JobExecutionError {
    match err.kind {
        ErrorKind::Database | ErrorKind::ExternalService | ErrorKind::ServiceUnavailable => {
            JobExecutionError::Transient(err.to_string())
        }
        _ => JobExecutionError::Permanent(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outages_are_transient() {
        assert!(classify(AppError::database("pool timed out")).is_transient());
        assert!(classify(AppError::external_service("502")).is_transient());
        assert!(!classify(AppError::validation("bad settings")).is_transient());
    }
}
