//! Response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status string.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
}

/// A URL the browser should open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResponse {
    /// Absolute URL.
    pub url: String,
}

/// Acknowledgement of a queued backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupQueuedResponse {
    /// Queued job.
    pub job_id: Uuid,
    /// Message for the user.
    pub message: String,
}

/// Plain message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message for the user.
    pub message: String,
}
