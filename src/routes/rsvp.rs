/**
 * RSVP Routes
 * Public submission, admin listing
 */
use axum::{extract::State, Json};
use regex::Regex;

use crate::auth::AdminUser;
use crate::db::models::{NewRsvp, Rsvp};
use crate::db::rsvp;
use crate::error::{ApiError, ApiResult};
use crate::routes::ApiJson;
use crate::state::AppState;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex");
}

fn validate(new: &NewRsvp) -> ApiResult<()> {
    if new.guest_name.trim().is_empty() {
        return Err(ApiError::Validation("Guest name is required".to_string()));
    }
    if !EMAIL_REGEX.is_match(new.email.trim()) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

/// POST /api/rsvp
pub async fn create_rsvp(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewRsvp>,
) -> ApiResult<Json<Rsvp>> {
    validate(&new)?;
    Ok(Json(rsvp::create(state.pool()?, new).await?))
}

/// GET /api/rsvp - newest first
pub async fn list_rsvps(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Rsvp>>> {
    Ok(Json(rsvp::list(state.pool()?).await?))
}
