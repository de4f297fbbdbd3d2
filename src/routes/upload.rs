/**
 * Upload Routes
 * Image upload to blob storage (local disk when remote is unavailable)
 */
use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::routes::ApiPath;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /api/upload - multipart with a single file part (named `file`)
pub async fn upload_file(
    State(state): State<AppState>,
    admin: AdminUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if field.name().is_some_and(|name| name != "file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;

        let limit = state.settings.max_upload_bytes;
        if bytes.len() > limit {
            return Err(ApiError::Validation(format!(
                "File too large. Maximum size is {} bytes",
                limit
            )));
        }

        let url = state
            .blobs
            .store(bytes, &filename, content_type.as_deref())
            .await?;
        tracing::info!(admin = %admin.username, filename = %filename, url = %url, "file uploaded");
        return Ok(Json(UploadResponse { url }));
    }

    Err(ApiError::Validation("No file provided".to_string()))
}

/// DELETE /api/upload/{filename} - accepts a bare name or a full URL-encoded URL
pub async fn delete_file(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiPath(filename): ApiPath<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.blobs.remove(&filename).await?;
    tracing::info!(admin = %admin.username, filename = %filename, "file deleted");
    Ok(MessageResponse::new("File deleted"))
}
