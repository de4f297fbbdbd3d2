//! Wedding info sections.
//!
//! The gallery is stored as a JSON array in a text column. Encoding and
//! decoding happen here and nowhere else; the rest of the crate only sees
//! `Vec<String>`.

use sqlx::{Executor, FromRow, Sqlite, SqlitePool};

use crate::db::models::{InfoSectionPatch, NewInfoSection, WeddingInfoSection};
use crate::db::ordering::{ReorderError, INFO_SECTIONS, ORDER_CLAUSE};

const COLUMNS: &str = "id, title, description, icon, section_type, map_embed_url, image_url, \
     gallery_urls, additional_info, sort_order";

#[derive(Debug, FromRow)]
struct InfoRow {
    id: i64,
    title: String,
    description: Option<String>,
    icon: Option<String>,
    section_type: String,
    map_embed_url: Option<String>,
    image_url: Option<String>,
    gallery_urls: Option<String>,
    additional_info: Option<String>,
    sort_order: i64,
}

impl InfoRow {
    /// The section exactly as stored.
    fn into_stored(self) -> WeddingInfoSection {
        WeddingInfoSection {
            gallery_urls: decode_gallery(self.id, self.gallery_urls.as_deref()),
            id: self.id,
            title: self.title,
            description: self.description,
            icon: self.icon,
            section_type: self.section_type,
            map_embed_url: self.map_embed_url,
            image_url: self.image_url,
            additional_info: self.additional_info,
            sort_order: self.sort_order,
        }
    }

    fn into_section(self) -> WeddingInfoSection {
        with_legacy_gallery(self.into_stored())
    }
}

/// `None` for an empty gallery so the column stays NULL.
fn encode_gallery(urls: &[String]) -> Result<Option<String>, sqlx::Error> {
    if urls.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(urls)
        .map(Some)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

fn decode_gallery(id: i64, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(urls) => urls.into_iter().filter(|u| !u.trim().is_empty()).collect(),
        Err(e) => {
            tracing::warn!(section_id = id, error = %e, "unreadable gallery_urls, ignoring");
            Vec::new()
        }
    }
}

/// Sections from before galleries existed only have `image_url`; surface it
/// as a one-image gallery.
fn with_legacy_gallery(mut section: WeddingInfoSection) -> WeddingInfoSection {
    if section.gallery_urls.is_empty() {
        if let Some(url) = section.image_url.as_ref().filter(|u| !u.trim().is_empty()) {
            section.gallery_urls = vec![url.clone()];
        }
    }
    section
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<WeddingInfoSection>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InfoRow>(&format!(
        "SELECT {} FROM wedding_info_sections {}",
        COLUMNS, ORDER_CLAUSE
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(InfoRow::into_section).collect())
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<Option<InfoRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, InfoRow>(&format!(
        "SELECT {} FROM wedding_info_sections WHERE id = ?",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create(
    pool: &SqlitePool,
    new: NewInfoSection,
) -> Result<WeddingInfoSection, sqlx::Error> {
    let gallery = encode_gallery(&new.gallery_urls)?;

    let mut tx = pool.begin().await?;
    let sort_order = INFO_SECTIONS.next_order(&mut *tx).await?;
    let row = sqlx::query_as::<_, InfoRow>(&format!(
        "INSERT INTO wedding_info_sections \
         (title, description, icon, section_type, map_embed_url, image_url, gallery_urls, \
          additional_info, sort_order) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {}",
        COLUMNS
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.icon)
    .bind(&new.section_type)
    .bind(&new.map_embed_url)
    .bind(&new.image_url)
    .bind(gallery)
    .bind(&new.additional_info)
    .bind(sort_order)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row.into_section())
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    patch: InfoSectionPatch,
) -> Result<Option<WeddingInfoSection>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(row) = fetch(&mut *tx, id).await? else {
        return Ok(None);
    };
    let mut section = row.into_stored();
    patch.apply(&mut section);

    sqlx::query(
        "UPDATE wedding_info_sections SET title = ?, description = ?, icon = ?, \
         section_type = ?, map_embed_url = ?, image_url = ?, gallery_urls = ?, \
         additional_info = ?, sort_order = ? WHERE id = ?",
    )
    .bind(&section.title)
    .bind(&section.description)
    .bind(&section.icon)
    .bind(&section.section_type)
    .bind(&section.map_embed_url)
    .bind(&section.image_url)
    .bind(encode_gallery(&section.gallery_urls)?)
    .bind(&section.additional_info)
    .bind(section.sort_order)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(Some(with_legacy_gallery(section)))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM wedding_info_sections WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn reorder(
    pool: &SqlitePool,
    ids: &[i64],
) -> Result<Vec<WeddingInfoSection>, ReorderError> {
    INFO_SECTIONS.reorder(pool, ids).await?;
    Ok(list(pool).await?)
}
