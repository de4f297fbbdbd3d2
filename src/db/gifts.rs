//! Gift registry items.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::db::models::{GiftItem, GiftItemPatch, NewGiftItem};
use crate::db::ordering::{GIFT_ITEMS, ORDER_CLAUSE};

const COLUMNS: &str = "id, title, description, link, image_url, item_type, sort_order";

pub async fn list(pool: &SqlitePool) -> Result<Vec<GiftItem>, sqlx::Error> {
    sqlx::query_as::<_, GiftItem>(&format!("SELECT {} FROM gift_items {}", COLUMNS, ORDER_CLAUSE))
        .fetch_all(pool)
        .await
}

async fn fetch<'e, E>(executor: E, id: i64) -> Result<Option<GiftItem>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, GiftItem>(&format!("SELECT {} FROM gift_items WHERE id = ?", COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn create(pool: &SqlitePool, new: NewGiftItem) -> Result<GiftItem, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let sort_order = match new.order {
        Some(order) => order,
        None => GIFT_ITEMS.next_order(&mut *tx).await?,
    };
    let item = sqlx::query_as::<_, GiftItem>(&format!(
        "INSERT INTO gift_items (title, description, link, image_url, item_type, sort_order) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
        COLUMNS
    ))
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.link)
    .bind(&new.image_url)
    .bind(new.item_type)
    .bind(sort_order)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(item)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    patch: GiftItemPatch,
) -> Result<Option<GiftItem>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(mut item) = fetch(&mut *tx, id).await? else {
        return Ok(None);
    };
    patch.apply(&mut item);

    sqlx::query(
        "UPDATE gift_items SET title = ?, description = ?, link = ?, image_url = ?, \
         item_type = ?, sort_order = ? WHERE id = ?",
    )
    .bind(&item.title)
    .bind(&item.description)
    .bind(&item.link)
    .bind(&item.image_url)
    .bind(item.item_type)
    .bind(item.sort_order)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(Some(item))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM gift_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::GiftItemType;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_item_type_roundtrips_through_storage() {
        let pool = test_pool().await;
        let created = create(
            &pool,
            NewGiftItem {
                title: "Honeymoon fund".into(),
                description: Some("Help us get to Lisbon".into()),
                link: String::new(),
                image_url: None,
                item_type: GiftItemType::Card,
                order: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.sort_order, 0);

        let stored: String = sqlx::query_scalar("SELECT item_type FROM gift_items WHERE id = ?")
            .bind(created.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, "card");

        let patch: GiftItemPatch = serde_json::from_str(
            r#"{"item_type": "external", "link": "https://shop.example/list"}"#,
        )
        .unwrap();
        let updated = update(&pool, created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.item_type, GiftItemType::External);

        let listed = list(&pool).await.unwrap();
        assert_eq!(listed[0].link, "https://shop.example/list");
        assert_eq!(listed[0].description.as_deref(), Some("Help us get to Lisbon"));
    }
}
