//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Instant;

use sqlx::SqlitePool;

use crate::auth::{hash_password, TokenService};
use crate::config::Settings;
use crate::error::ApiError;
use crate::storage::BlobGateway;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// `None` when the database could not be reached at startup.
    pub db: Option<SqlitePool>,
    pub tokens: Arc<TokenService>,
    pub blobs: Arc<BlobGateway>,
    pub started_at: Instant,
    /// Hash checked when the username is unknown, so a miss costs as much
    /// as a wrong password.
    pub login_decoy: Arc<String>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        db: Option<SqlitePool>,
        tokens: TokenService,
        blobs: BlobGateway,
    ) -> Self {
        let login_decoy = match hash_password("not-a-real-password", settings.bcrypt_cost) {
            Ok(hashed) => hashed,
            Err(e) => {
                tracing::warn!(error = %e, "cannot build login decoy hash");
                String::new()
            }
        };

        Self {
            login_decoy: Arc::new(login_decoy),
            settings: Arc::new(settings),
            db,
            tokens: Arc::new(tokens),
            blobs: Arc::new(blobs),
            started_at: Instant::now(),
        }
    }

    pub fn pool(&self) -> Result<&SqlitePool, ApiError> {
        self.db.as_ref().ok_or(ApiError::DatabaseUnavailable)
    }
}
