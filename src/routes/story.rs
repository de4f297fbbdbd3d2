/**
 * Story Routes
 * "Our story" sections and the photo strip that goes with them
 */
use axum::{
    extract::State,
    Json,
};
use sqlx::SqlitePool;

use crate::auth::AdminUser;
use crate::db::models::{
    NewStoryImage, NewStorySection, StoryImage, StoryImagePatch, StorySection, StorySectionPatch,
};
use crate::db::story;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

/// An image may only point at a section that exists.
async fn check_section(pool: &SqlitePool, section_id: Option<i64>) -> ApiResult<()> {
    match section_id {
        Some(id) if !story::section_exists(pool, id).await? => {
            Err(ApiError::Validation(format!("Story section {} does not exist", id)))
        }
        _ => Ok(()),
    }
}

pub async fn list_sections(State(state): State<AppState>) -> ApiResult<Json<Vec<StorySection>>> {
    Ok(Json(story::list_sections(state.pool()?).await?))
}

pub async fn create_section(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewStorySection>,
) -> ApiResult<Json<StorySection>> {
    Ok(Json(story::create_section(state.pool()?, new).await?))
}

pub async fn update_section(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<StorySectionPatch>,
) -> ApiResult<Json<StorySection>> {
    story::update_section(state.pool()?, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Story section"))
}

pub async fn delete_section(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !story::delete_section(state.pool()?, id).await? {
        return Err(ApiError::not_found("Story section"));
    }
    Ok(MessageResponse::new("Story section deleted"))
}

pub async fn list_images(State(state): State<AppState>) -> ApiResult<Json<Vec<StoryImage>>> {
    Ok(Json(story::list_images(state.pool()?).await?))
}

pub async fn create_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewStoryImage>,
) -> ApiResult<Json<StoryImage>> {
    let pool = state.pool()?;
    check_section(pool, new.section_id).await?;
    Ok(Json(story::create_image(pool, new).await?))
}

pub async fn update_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<StoryImagePatch>,
) -> ApiResult<Json<StoryImage>> {
    let pool = state.pool()?;
    check_section(pool, patch.section_id.flatten()).await?;
    story::update_image(pool, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Story image"))
}

pub async fn delete_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !story::delete_image(state.pool()?, id).await? {
        return Err(ApiError::not_found("Story image"));
    }
    Ok(MessageResponse::new("Story image deleted"))
}

/// PUT /api/story/images/reorder - body is the full list of image ids
pub async fn reorder_images(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(ids): ApiJson<Vec<i64>>,
) -> ApiResult<Json<Vec<StoryImage>>> {
    Ok(Json(story::reorder_images(state.pool()?, &ids).await?))
}
