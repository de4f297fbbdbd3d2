/**
 * Frontend Fallback
 * Serves the bundled single-page app for any path the API does not own
 */
use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::ApiError;
use crate::state::AppState;

/// Prefixes that never fall through to the frontend.
const RESERVED_PREFIXES: &[&str] = &["/api", "/auth", "/static", "/docs", "/health"];

fn is_reserved(path: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

pub async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    if is_reserved(&path) {
        return ApiError::NotFound("Not found".to_string()).into_response();
    }

    let dir = &state.settings.frontend_dir;
    let index = dir.join("index.html");
    if !tokio::fs::try_exists(&index).await.unwrap_or(false) {
        if path == "/" {
            return Json(json!({ "message": "Wedding Website API" })).into_response();
        }
        return ApiError::NotFound("Not found".to_string()).into_response();
    }

    // Unknown paths get index.html so client-side routing can take over.
    let serve = ServeDir::new(dir).fallback(ServeFile::new(index));
    match serve.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_paths() {
        assert!(is_reserved("/api"));
        assert!(is_reserved("/api/home"));
        assert!(is_reserved("/auth/login"));
        assert!(is_reserved("/static/uploads/x.png"));
        assert!(is_reserved("/docs"));
        assert!(!is_reserved("/"));
        assert!(!is_reserved("/apiary"));
        assert!(!is_reserved("/gallery"));
    }
}
