//! Display order for ordered collections.
//!
//! Every ordered table carries an integer `sort_order`. New members are
//! appended after the current maximum; a reorder rewrites the whole
//! collection to positions `0..n` in one transaction. Reads sort by
//! `sort_order, id` so equal orders still come back in a stable sequence.

use std::collections::HashSet;

use sqlx::{Executor, Sqlite, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReorderError {
    #[error("Expected {expected} ids, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("Duplicate id {0} in reorder list")]
    Duplicate(i64),

    #[error("Unknown id {0} in reorder list")]
    Unknown(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct OrderedCollection {
    pub table: &'static str,
    /// Human label used in log lines.
    pub label: &'static str,
}

pub const STORY_SECTIONS: OrderedCollection = OrderedCollection {
    table: "story_sections",
    label: "story sections",
};
pub const STORY_IMAGES: OrderedCollection = OrderedCollection {
    table: "story_images",
    label: "story images",
};
pub const INFO_SECTIONS: OrderedCollection = OrderedCollection {
    table: "wedding_info_sections",
    label: "info sections",
};
pub const TIMELINE_EVENTS: OrderedCollection = OrderedCollection {
    table: "timeline_events",
    label: "timeline events",
};
pub const GALLERY_IMAGES: OrderedCollection = OrderedCollection {
    table: "gallery_images",
    label: "gallery images",
};
pub const GIFT_ITEMS: OrderedCollection = OrderedCollection {
    table: "gift_items",
    label: "gift items",
};

/// `ORDER BY` clause shared by every ordered list query.
pub const ORDER_CLAUSE: &str = "ORDER BY sort_order ASC, id ASC";

impl OrderedCollection {
    /// Order value for a member appended now: max + 1, or 0 when empty.
    pub async fn next_order<'e, E>(&self, executor: E) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT MAX(sort_order) FROM {}", self.table);
        let max: Option<i64> = sqlx::query_scalar(&sql).fetch_one(executor).await?;
        Ok(max.map_or(0, |max| max + 1))
    }

    /// Reassign `sort_order` to each id's position in `ids`.
    ///
    /// `ids` must name every existing member exactly once; anything else is
    /// rejected before a single row changes.
    pub async fn reorder(&self, pool: &SqlitePool, ids: &[i64]) -> Result<(), ReorderError> {
        let mut tx = pool.begin().await?;

        let sql = format!("SELECT id FROM {}", self.table);
        let existing: Vec<i64> = sqlx::query_scalar(&sql).fetch_all(&mut *tx).await?;
        check_permutation(&existing, ids)?;

        let sql = format!("UPDATE {} SET sort_order = ? WHERE id = ?", self.table);
        for (position, id) in ids.iter().enumerate() {
            sqlx::query(&sql)
                .bind(position as i64)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(collection = self.label, count = ids.len(), "reordered");
        Ok(())
    }
}

/// `requested` must be a permutation of `existing`.
pub fn check_permutation(existing: &[i64], requested: &[i64]) -> Result<(), ReorderError> {
    if existing.len() != requested.len() {
        return Err(ReorderError::CountMismatch {
            expected: existing.len(),
            got: requested.len(),
        });
    }

    let known: HashSet<i64> = existing.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());
    for &id in requested {
        if !seen.insert(id) {
            return Err(ReorderError::Duplicate(id));
        }
        if !known.contains(&id) {
            return Err(ReorderError::Unknown(id));
        }
    }
    Ok(())
}
