//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use integrahub_core::config::AppConfig;
use integrahub_service::{DropboxBackupService, PaymentGatewayRegistry, RazorpayGateway};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// When the server started.
    pub started_at: Instant,
    /// Payment gateways by name.
    pub payments: Arc<PaymentGatewayRegistry>,
    /// Razorpay controller.
    pub razorpay: RazorpayGateway,
    /// Dropbox backups and OAuth.
    pub backups: Arc<DropboxBackupService>,
}
