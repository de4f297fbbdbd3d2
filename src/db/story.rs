//! Story sections and story images.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::db::models::{
    NewStoryImage, NewStorySection, StoryImage, StoryImagePatch, StorySection, StorySectionPatch,
};
use crate::db::ordering::{ReorderError, ORDER_CLAUSE, STORY_IMAGES, STORY_SECTIONS};

// ============================================================================
// Sections
// ============================================================================

pub async fn list_sections(pool: &SqlitePool) -> Result<Vec<StorySection>, sqlx::Error> {
    sqlx::query_as::<_, StorySection>(&format!(
        "SELECT id, title, content, sort_order FROM story_sections {}",
        ORDER_CLAUSE
    ))
    .fetch_all(pool)
    .await
}

async fn fetch_section<'e, E>(executor: E, id: i64) -> Result<Option<StorySection>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, StorySection>(
        "SELECT id, title, content, sort_order FROM story_sections WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn section_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    Ok(fetch_section(pool, id).await?.is_some())
}

pub async fn create_section(
    pool: &SqlitePool,
    new: NewStorySection,
) -> Result<StorySection, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let sort_order = match new.order {
        Some(order) => order,
        None => STORY_SECTIONS.next_order(&mut *tx).await?,
    };
    let section = sqlx::query_as::<_, StorySection>(
        "INSERT INTO story_sections (title, content, sort_order) VALUES (?, ?, ?) \
         RETURNING id, title, content, sort_order",
    )
    .bind(&new.title)
    .bind(&new.content)
    .bind(sort_order)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(section)
}

pub async fn update_section(
    pool: &SqlitePool,
    id: i64,
    patch: StorySectionPatch,
) -> Result<Option<StorySection>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(mut section) = fetch_section(&mut *tx, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut section);

    sqlx::query("UPDATE story_sections SET title = ?, content = ?, sort_order = ? WHERE id = ?")
        .bind(&section.title)
        .bind(&section.content)
        .bind(section.sort_order)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Some(section))
}

/// Delete a section. Images that pointed at it stay, unassigned.
pub async fn delete_section(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let detached = sqlx::query("UPDATE story_images SET section_id = NULL WHERE section_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let deleted = sqlx::query("DELETE FROM story_sections WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    if deleted > 0 && detached > 0 {
        tracing::info!(section_id = id, images = detached, "detached story images");
    }
    Ok(deleted > 0)
}

// ============================================================================
// Images
// ============================================================================

const IMAGE_COLUMNS: &str = "id, image_url, caption, sort_order, section_id";

pub async fn list_images(pool: &SqlitePool) -> Result<Vec<StoryImage>, sqlx::Error> {
    sqlx::query_as::<_, StoryImage>(&format!(
        "SELECT {} FROM story_images {}",
        IMAGE_COLUMNS, ORDER_CLAUSE
    ))
    .fetch_all(pool)
    .await
}

async fn fetch_image<'e, E>(executor: E, id: i64) -> Result<Option<StoryImage>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, StoryImage>(&format!(
        "SELECT {} FROM story_images WHERE id = ?",
        IMAGE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// New images always go to the end of the strip.
pub async fn create_image(pool: &SqlitePool, new: NewStoryImage) -> Result<StoryImage, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let sort_order = STORY_IMAGES.next_order(&mut *tx).await?;
    let image = sqlx::query_as::<_, StoryImage>(&format!(
        "INSERT INTO story_images (image_url, caption, sort_order, section_id) \
         VALUES (?, ?, ?, ?) RETURNING {}",
        IMAGE_COLUMNS
    ))
    .bind(&new.image_url)
    .bind(&new.caption)
    .bind(sort_order)
    .bind(new.section_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(image)
}

pub async fn update_image(
    pool: &SqlitePool,
    id: i64,
    patch: StoryImagePatch,
) -> Result<Option<StoryImage>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(mut image) = fetch_image(&mut *tx, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut image);

    sqlx::query(
        "UPDATE story_images SET image_url = ?, caption = ?, sort_order = ?, section_id = ? \
         WHERE id = ?",
    )
    .bind(&image.image_url)
    .bind(&image.caption)
    .bind(image.sort_order)
    .bind(image.section_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(Some(image))
}

pub async fn delete_image(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM story_images WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn reorder_images(
    pool: &SqlitePool,
    ids: &[i64],
) -> Result<Vec<StoryImage>, ReorderError> {
    STORY_IMAGES.reorder(pool, ids).await?;
    Ok(list_images(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn new_image(url: &str, section_id: Option<i64>) -> NewStoryImage {
        NewStoryImage {
            image_url: url.to_string(),
            caption: None,
            section_id,
        }
    }

    #[tokio::test]
    async fn test_sections_use_explicit_order_or_append() {
        let pool = test_pool().await;
        let pinned = create_section(
            &pool,
            NewStorySection {
                title: "Proposal".into(),
                content: "...".into(),
                order: Some(10),
            },
        )
        .await
        .unwrap();
        let appended = create_section(
            &pool,
            NewStorySection {
                title: "Afterwards".into(),
                content: "...".into(),
                order: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(pinned.sort_order, 10);
        assert_eq!(appended.sort_order, 11);
    }

    #[tokio::test]
    async fn test_images_append_in_creation_order() {
        let pool = test_pool().await;
        for (i, url) in ["a.png", "b.png", "c.png"].iter().enumerate() {
            let image = create_image(&pool, new_image(url, None)).await.unwrap();
            assert_eq!(image.sort_order, i as i64);
        }
        let urls: Vec<String> = list_images(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.image_url)
            .collect();
        assert_eq!(urls, vec!["a.png", "b.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_deleting_section_detaches_images() {
        let pool = test_pool().await;
        let section = create_section(
            &pool,
            NewStorySection {
                title: "How we met".into(),
                content: "...".into(),
                order: None,
            },
        )
        .await
        .unwrap();
        let image = create_image(&pool, new_image("a.png", Some(section.id)))
            .await
            .unwrap();
        assert_eq!(image.section_id, Some(section.id));

        assert!(delete_section(&pool, section.id).await.unwrap());
        assert!(!delete_section(&pool, section.id).await.unwrap());

        let images = list_images(&pool).await.unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, image.id);
        assert_eq!(images[0].section_id, None);
    }

    #[tokio::test]
    async fn test_update_missing_image_is_none() {
        let pool = test_pool().await;
        let result = update_image(&pool, 42, StoryImagePatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_reorder_images_returns_new_sequence() {
        let pool = test_pool().await;
        let a = create_image(&pool, new_image("a.png", None)).await.unwrap();
        let b = create_image(&pool, new_image("b.png", None)).await.unwrap();

        let images = reorder_images(&pool, &[b.id, a.id]).await.unwrap();
        assert_eq!(images[0].id, b.id);
        assert_eq!(images[0].sort_order, 0);
        assert_eq!(images[1].sort_order, 1);

        assert!(reorder_images(&pool, &[b.id]).await.is_err());
    }
}
