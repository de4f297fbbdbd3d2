//! Administrator credential store.
//!
//! There is exactly one administrator, kept in sync with the configured
//! username and password every time the server starts.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::auth::{hash_password, verify_password};
use crate::db::models::AdminCredential;

#[derive(Debug, Error)]
pub enum AdminSyncError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSync {
    Created,
    Updated,
    Unchanged,
}

/// Case-insensitive lookup by username.
pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<AdminCredential>, sqlx::Error> {
    sqlx::query_as::<_, AdminCredential>(
        "SELECT id, username, hashed_password FROM admin_users WHERE LOWER(username) = LOWER(?)",
    )
    .bind(username.trim())
    .fetch_optional(pool)
    .await
}

/// Make the stored administrator match the configured credentials.
///
/// The row whose username matches the configuration is kept, or the oldest
/// row when none does. Every other row is removed in the same transaction,
/// so exactly one administrator remains.
pub async fn reconcile(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    cost: u32,
) -> Result<AdminSync, AdminSyncError> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query_as::<_, AdminCredential>(
        "SELECT id, username, hashed_password FROM admin_users ORDER BY id",
    )
    .fetch_all(&mut *tx)
    .await?;

    let keep = rows
        .iter()
        .find(|row| row.username.eq_ignore_ascii_case(username))
        .or_else(|| rows.first())
        .cloned();

    let removed = match &keep {
        Some(admin) => sqlx::query("DELETE FROM admin_users WHERE id <> ?")
            .bind(admin.id)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
        None => 0,
    };
    if removed > 0 {
        tracing::warn!(removed, "removed extra administrator rows");
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    let outcome = match keep {
        None => {
            let hashed = hash_blocking(password, cost).await?;
            sqlx::query("INSERT INTO admin_users (username, hashed_password) VALUES (?, ?)")
                .bind(username)
                .bind(hashed)
                .execute(&mut *tx)
                .await?;
            AdminSync::Created
        }
        Some(admin) => {
            let candidate = password.to_string();
            let stored = admin.hashed_password.clone();
            let password_matches =
                tokio::task::spawn_blocking(move || verify_password(&candidate, &stored)).await?;

            if admin.username == username && password_matches {
                if removed > 0 {
                    AdminSync::Updated
                } else {
                    AdminSync::Unchanged
                }
            } else {
                let hashed = if password_matches {
                    admin.hashed_password
                } else {
                    hash_blocking(password, cost).await?
                };
                sqlx::query("UPDATE admin_users SET username = ?, hashed_password = ? WHERE id = ?")
                    .bind(username)
                    .bind(hashed)
                    .bind(admin.id)
                    .execute(&mut *tx)
                    .await?;
                AdminSync::Updated
            }
        }
    };

    tx.commit().await?;

    tracing::info!(username = %username, outcome = ?outcome, "admin credentials reconciled");
    Ok(outcome)
}

async fn hash_blocking(password: &str, cost: u32) -> Result<String, AdminSyncError> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;
    Ok(hashed)
}
