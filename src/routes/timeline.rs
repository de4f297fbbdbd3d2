/**
 * Timeline Routes
 * Schedule of the wedding day
 */
use axum::{
    extract::State,
    Json,
};

use crate::auth::AdminUser;
use crate::db::models::{NewTimelineEvent, TimelineEvent, TimelineEventPatch};
use crate::db::timeline;
use crate::error::{ApiError, ApiResult, MessageResponse};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<TimelineEvent>>> {
    Ok(Json(timeline::list(state.pool()?).await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(new): ApiJson<NewTimelineEvent>,
) -> ApiResult<Json<TimelineEvent>> {
    Ok(Json(timeline::create(state.pool()?, new).await?))
}

pub async fn update_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<TimelineEventPatch>,
) -> ApiResult<Json<TimelineEvent>> {
    timeline::update(state.pool()?, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Timeline event"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !timeline::delete(state.pool()?, id).await? {
        return Err(ApiError::not_found("Timeline event"));
    }
    Ok(MessageResponse::new("Timeline event deleted"))
}

pub async fn reorder_events(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(ids): ApiJson<Vec<i64>>,
) -> ApiResult<Json<Vec<TimelineEvent>>> {
    Ok(Json(timeline::reorder(state.pool()?, &ids).await?))
}
