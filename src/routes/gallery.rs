/**
 * Gallery Routes
 */
use axum::{
    extract::State,
    Json,
};

use crate::auth::AdminUser;
use crate::db::gallery;
use crate::db::models::{GalleryImage, GalleryImagePatch, NewGalleryImage};
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list_images(State(state): State<AppState>) -> ApiResult<Json<Vec<GalleryImage>>> {
    Ok(Json(gallery::list(state.pool()?).await?))
}

pub async fn create_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewGalleryImage>,
) -> ApiResult<Json<GalleryImage>> {
    Ok(Json(gallery::create(state.pool()?, new).await?))
}

pub async fn update_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<GalleryImagePatch>,
) -> ApiResult<Json<GalleryImage>> {
    gallery::update(state.pool()?, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Gallery image"))
}

pub async fn delete_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !gallery::delete(state.pool()?, id).await? {
        return Err(ApiError::not_found("Gallery image"));
    }
    Ok(MessageResponse::new("Gallery image deleted"))
}
