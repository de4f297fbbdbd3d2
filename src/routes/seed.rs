/**
 * Seed Routes
 * Load or wipe the demo content
 */
use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::AdminUser;
use crate::db::seed::{self, SeedSummary};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub added: SeedSummary,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub deleted_items: u64,
}

/// POST /api/seed/demo
pub async fn seed_demo(
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<Json<SeedResponse>> {
    let added = seed::seed_demo(state.pool()?).await?;
    tracing::info!(admin = %admin.username, "demo content loaded");
    Ok(Json(SeedResponse {
        message: "Demo content added".to_string(),
        added,
    }))
}

/// DELETE /api/seed/demo
pub async fn clear_demo(
    State(state): State<AppState>,
    admin: AdminUser,
) -> ApiResult<Json<ClearResponse>> {
    let deleted_items = seed::clear_demo(state.pool()?).await?;
    tracing::info!(admin = %admin.username, deleted_items, "site content cleared");
    Ok(Json(ClearResponse {
        message: "Site content cleared".to_string(),
        deleted_items,
    }))
}
