//! Photo gallery.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::db::models::{GalleryImage, GalleryImagePatch, NewGalleryImage};
use crate::db::ordering::{GALLERY_IMAGES, ORDER_CLAUSE};

pub async fn list(pool: &SqlitePool) -> Result<Vec<GalleryImage>, sqlx::Error> {
    sqlx::query_as::<_, GalleryImage>(&format!(
        "SELECT id, image_url, caption, sort_order FROM gallery_images {}",
        ORDER_CLAUSE
    ))
    .fetch_all(pool)
    .await
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<Option<GalleryImage>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, GalleryImage>(
        "SELECT id, image_url, caption, sort_order FROM gallery_images WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create(pool: &SqlitePool, new: NewGalleryImage) -> Result<GalleryImage, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let sort_order = match new.order {
        Some(order) => order,
        None => GALLERY_IMAGES.next_order(&mut *tx).await?,
    };
    let image = sqlx::query_as::<_, GalleryImage>(
        "INSERT INTO gallery_images (image_url, caption, sort_order) VALUES (?, ?, ?) \
         RETURNING id, image_url, caption, sort_order",
    )
    .bind(&new.image_url)
    .bind(&new.caption)
    .bind(sort_order)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(image)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    patch: GalleryImagePatch,
) -> Result<Option<GalleryImage>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(mut image) = fetch(&mut *tx, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut image);

    sqlx::query("UPDATE gallery_images SET image_url = ?, caption = ?, sort_order = ? WHERE id = ?")
        .bind(&image.image_url)
        .bind(&image.caption)
        .bind(image.sort_order)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Some(image))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM gallery_images WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
