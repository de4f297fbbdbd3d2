/**
 * Gift Registry Routes
 */
use axum::{
    extract::State,
    Json,
};

use crate::auth::AdminUser;
use crate::db::gifts;
use crate::db::models::{GiftItem, GiftItemPatch, NewGiftItem};
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list_items(State(state): State<AppState>) -> ApiResult<Json<Vec<GiftItem>>> {
    Ok(Json(gifts::list(state.pool()?).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewGiftItem>,
) -> ApiResult<Json<GiftItem>> {
    Ok(Json(gifts::create(state.pool()?, new).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<GiftItemPatch>,
) -> ApiResult<Json<GiftItem>> {
    gifts::update(state.pool()?, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Gift item"))
}

pub async fn delete_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !gifts::delete(state.pool()?, id).await? {
        return Err(ApiError::not_found("Gift item"));
    }
    Ok(MessageResponse::new("Gift item deleted"))
}
