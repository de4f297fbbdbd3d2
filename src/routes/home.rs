/**
 * Home Routes
 * The singleton hero/theme record
 */
use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::AdminUser;
use crate::db::home;
use crate::db::models::{HomeContent, HomeContentPatch};
use crate::error::ApiResult;
use crate::routes::ApiJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub content: HomeContent,
}

/// GET /api/home
pub async fn get_home(State(state): State<AppState>) -> ApiResult<Json<HomeContent>> {
    Ok(Json(home::get(state.pool()?).await?))
}

/// PUT /api/home
pub async fn update_home(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(patch): ApiJson<HomeContentPatch>,
) -> ApiResult<Json<HomeContent>> {
    Ok(Json(home::update(state.pool()?, patch).await?))
}

/// POST /api/home/reset-defaults
pub async fn reset_defaults(
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<Json<ResetResponse>> {
    let content = home::reset_defaults(state.pool()?).await?;
    tracing::info!(admin = %admin.username, "home content reset to defaults");
    Ok(Json(ResetResponse {
        message: "Home content reset to defaults".to_string(),
        content,
    }))
}
