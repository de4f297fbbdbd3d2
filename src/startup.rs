//! Startup sequence. Every step here may fail without taking the process
//! down: the server still answers `/health` and reports 503 for anything
//! that needs the database.

use std::fmt::Display;
use std::future::Future;

use sqlx::SqlitePool;

use crate::config::Settings;
use crate::db::{self, admin, DbConfig};

/// Run a startup step; on failure log a warning naming the step and carry on.
pub async fn non_fatal<T, E, F>(step: &'static str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(step, error = %e, "startup step failed, continuing without it");
            None
        }
    }
}

/// Connect, migrate and reconcile the administrator. Returns the pool when a
/// connection could be made, even if a later step failed.
pub async fn bootstrap(settings: &Settings) -> Option<SqlitePool> {
    let config = DbConfig::from(settings);
    let pool = non_fatal("database connection", db::init_pool(&config)).await?;

    non_fatal("database migrations", db::run_migrations(&pool)).await;

    let sync = admin::reconcile(
        &pool,
        &settings.admin_username,
        &settings.admin_password,
        settings.bcrypt_cost,
    );
    non_fatal("admin reconciliation", sync).await;

    Some(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::admin::AdminSync;

    fn settings_with_db(url: String) -> Settings {
        Settings::from_lookup(move |key| match key {
            "DATABASE_URL" => Some(url.clone()),
            "BCRYPT_COST" => Some("4".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_non_fatal_swallows_errors() {
        let ok = non_fatal("ok step", async { Ok::<_, String>(3) }).await;
        assert_eq!(ok, Some(3));

        let failed = non_fatal("failing step", async { Err::<u8, _>("boom") }).await;
        assert_eq!(failed, None);
    }

    #[tokio::test]
    async fn test_bootstrap_without_database_returns_none() {
        let settings = settings_with_db("sqlite:///nonexistent-dir/for/sure/w.db".to_string());
        assert!(bootstrap(&settings).await.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_migrates_and_creates_admin() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("wedding.db").display());
        let settings = settings_with_db(url);

        let pool = bootstrap(&settings).await.unwrap();
        let admin = admin::find_by_username(&pool, "ADMIN").await.unwrap().unwrap();
        assert_eq!(admin.username, "admin");

        // second boot with the same settings leaves the row alone
        let outcome = admin::reconcile(&pool, "admin", "admin123", 4).await.unwrap();
        assert_eq!(outcome, AdminSync::Unchanged);
    }
}
