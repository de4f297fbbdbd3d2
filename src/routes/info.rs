/**
 * Info Routes
 * Practical information cards (ceremony, reception, dress code, ...)
 */
use axum::{
    extract::State,
    Json,
};

use crate::auth::AdminUser;
use crate::db::info;
use crate::db::models::{InfoSectionPatch, NewInfoSection, WeddingInfoSection};
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list_sections(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<WeddingInfoSection>>> {
    Ok(Json(info::list(state.pool()?).await?))
}

pub async fn create_section(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewInfoSection>,
) -> ApiResult<Json<WeddingInfoSection>> {
    Ok(Json(info::create(state.pool()?, new).await?))
}

pub async fn update_section(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<InfoSectionPatch>,
) -> ApiResult<Json<WeddingInfoSection>> {
    info::update(state.pool()?, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Info section"))
}

pub async fn delete_section(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !info::delete(state.pool()?, id).await? {
        return Err(ApiError::not_found("Info section"));
    }
    Ok(MessageResponse::new("Info section deleted"))
}

pub async fn reorder_sections(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(ids): ApiJson<Vec<i64>>,
) -> ApiResult<Json<Vec<WeddingInfoSection>>> {
    Ok(Json(info::reorder(state.pool()?, &ids).await?))
}
