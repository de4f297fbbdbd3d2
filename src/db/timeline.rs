//! Wedding day timeline events.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::db::models::{NewTimelineEvent, TimelineEvent, TimelineEventPatch};
use crate::db::ordering::{ReorderError, ORDER_CLAUSE, TIMELINE_EVENTS};

const COLUMNS: &str =
    "id, time, title, description, icon, sort_order, image_url, additional_info";

pub async fn list(pool: &SqlitePool) -> Result<Vec<TimelineEvent>, sqlx::Error> {
    sqlx::query_as::<_, TimelineEvent>(&format!(
        "SELECT {} FROM timeline_events {}",
        COLUMNS, ORDER_CLAUSE
    ))
    .fetch_all(pool)
    .await
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<Option<TimelineEvent>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, TimelineEvent>(&format!(
        "SELECT {} FROM timeline_events WHERE id = ?",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create(pool: &SqlitePool, new: NewTimelineEvent) -> Result<TimelineEvent, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let sort_order = TIMELINE_EVENTS.next_order(&mut *tx).await?;
    let event = sqlx::query_as::<_, TimelineEvent>(&format!(
        "INSERT INTO timeline_events \
         (time, title, description, icon, sort_order, image_url, additional_info) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {}",
        COLUMNS
    ))
    .bind(new.time)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.icon)
    .bind(sort_order)
    .bind(&new.image_url)
    .bind(&new.additional_info)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(event)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    patch: TimelineEventPatch,
) -> Result<Option<TimelineEvent>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(mut event) = fetch(&mut *tx, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut event);

    sqlx::query(
        "UPDATE timeline_events SET time = ?, title = ?, description = ?, icon = ?, \
         sort_order = ?, image_url = ?, additional_info = ? WHERE id = ?",
    )
    .bind(event.time)
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.icon)
    .bind(event.sort_order)
    .bind(&event.image_url)
    .bind(&event.additional_info)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(Some(event))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM timeline_events WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn reorder(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<TimelineEvent>, ReorderError> {
    TIMELINE_EVENTS.reorder(pool, ids).await?;
    Ok(list(pool).await?)
}
