/**
 * Authentication Routes
 * Admin login (JSON or form) and token verification
 */
use axum::{extract::State, http::HeaderMap, Form, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, verify_password};
use crate::db::admin;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiJson;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Incorrect username or password";

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Check the credentials and mint a token. Unknown user and wrong password
/// answer identically.
async fn authenticate(state: &AppState, credentials: LoginRequest) -> ApiResult<Json<TokenResponse>> {
    let pool = state.pool()?;
    let admin = admin::find_by_username(pool, &credentials.username).await?;

    // Unknown usernames still pay for a bcrypt check.
    let stored = match &admin {
        Some(admin) => admin.hashed_password.clone(),
        None => state.login_decoy.as_ref().clone(),
    };
    let password = credentials.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(format!("Password check failed: {}", e)))?;

    let admin = match admin {
        Some(admin) if matches => admin,
        _ => {
            tracing::warn!(username = %credentials.username, "login failed");
            return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
        }
    };

    let access_token = state
        .tokens
        .issue(&admin.username)
        .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))?;

    tracing::info!(username = %admin.username, "admin logged in");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    authenticate(&state, credentials).await
}

/// POST /auth/login-form
pub async fn login_form(
    State(state): State<AppState>,
    Form(credentials): Form<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    authenticate(&state, credentials).await
}

/// POST /auth/verify - never fails, reports validity in the body
pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Json<VerifyResponse> {
    let claims = bearer_token(&headers).and_then(|token| state.tokens.verify(token).ok());
    Json(VerifyResponse {
        valid: claims.is_some(),
        username: claims.map(|c| c.sub),
    })
}
