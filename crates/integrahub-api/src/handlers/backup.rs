//! Dropbox backup trigger and OAuth handlers.

use axum::Json;
use axum::extract::{Query, State};

use crate::dto::request::DropboxCallbackQuery;
use crate::dto::response::{ApiResponse, BackupQueuedResponse, MessageResponse, UrlResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/backups/dropbox
pub async fn take_backup(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BackupQueuedResponse>>, ApiError> {
    let job_id = state.backups.take_backup().await?;
    Ok(Json(ApiResponse::ok(BackupQueuedResponse {
        job_id: job_id.into_uuid(),
        message: "Queued for backup. It may take a few minutes to an hour.".to_string(),
    })))
}

/// GET /api/backups/dropbox/authorize-url
pub async fn authorize_url(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UrlResponse>>, ApiError> {
    let url = state.backups.authorize_url().await?;
    Ok(Json(ApiResponse::ok(UrlResponse { url })))
}

/// GET /api/backups/dropbox/callback
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<DropboxCallbackQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .backups
        .finish_auth(query.code.as_deref(), query.state.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Dropbox access is approved!".to_string(),
    })))
}
