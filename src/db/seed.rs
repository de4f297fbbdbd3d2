//! Demo content for a fresh install, and its removal.
//!
//! Seeding is additive: a demo row is skipped when a row with the same
//! natural key already exists, so running it twice changes nothing.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::home::{self, DEFAULT_HERO_TEXT, DEFAULT_SUBTITLE};
use crate::db::models::GiftItemType;
use crate::db::ordering::{
    GALLERY_IMAGES, GIFT_ITEMS, INFO_SECTIONS, STORY_IMAGES, STORY_SECTIONS, TIMELINE_EVENTS,
};

const DEMO_HERO_IMAGE: &str =
    "https://images.unsplash.com/photo-1519741497674-611481863552?w=1920&q=80";

const STORY_SECTIONS_DATA: &[(&str, &str)] = &[
    (
        "How we met",
        "We met on a spring afternoon in a small corner cafe. From the first \
         conversation we both knew something special was starting.",
    ),
    (
        "The proposal",
        "Under the clearest night sky we had ever seen, Joel knelt down and asked \
         the question. It was the most magical moment of our lives.",
    ),
    (
        "Our journey",
        "Together we have built dreams, shared laughter and faced challenges. \
         We cannot wait to begin this new chapter with all of you.",
    ),
];

const STORY_IMAGES_DATA: &[(&str, &str)] = &[
    (
        "https://images.unsplash.com/photo-1511285560929-80b456fea0bc?w=800&q=80",
        "Our first date",
    ),
    (
        "https://images.unsplash.com/photo-1519741497674-611481863552?w=800&q=80",
        "Special moments",
    ),
    (
        "https://images.unsplash.com/photo-1465495976277-4387d4b0b4c6?w=800&q=80",
        "Adventures together",
    ),
];

struct DemoInfo {
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    section_type: &'static str,
}

const INFO_SECTIONS_DATA: &[DemoInfo] = &[
    DemoInfo {
        title: "Ceremony",
        description: "The ceremony takes place in a historic chapel surrounded by gardens.",
        icon: "rings",
        section_type: "ceremony",
    },
    DemoInfo {
        title: "Reception",
        description: "After the ceremony we celebrate with dinner, music and dancing.",
        icon: "champagne",
        section_type: "reception",
    },
    DemoInfo {
        title: "Dress Code",
        description: "Formal attire. Soft colours and pastel tones are welcome.",
        icon: "dress",
        section_type: "dress_code",
    },
    DemoInfo {
        title: "Parking",
        description: "Parking is available on site. Please arrive a few minutes early.",
        icon: "car",
        section_type: "parking",
    },
    DemoInfo {
        title: "Accommodation",
        description: "For guests travelling in, we recommend the hotels listed below.",
        icon: "hotel",
        section_type: "hotel",
    },
];

const TIMELINE_DATA: &[(u32, u32, &str, &str, &str)] = &[
    (15, 0, "Ceremony", "Wedding ceremony in the chapel", "rings"),
    (16, 0, "Cocktails", "Welcome drinks and appetizers", "cocktail"),
    (17, 30, "Dinner", "Dinner served in the main hall", "dinner"),
    (19, 0, "Cake & Toast", "Cutting the cake and a toast to the couple", "cake"),
    (20, 0, "Party", "The dance floor is open!", "music"),
];

const GALLERY_DATA: &[(&str, &str)] = &[
    (
        "https://images.unsplash.com/photo-1519741497674-611481863552?w=1200&q=80",
        "Engagement shoot",
    ),
    (
        "https://images.unsplash.com/photo-1465495976277-4387d4b0b4c6?w=1200&q=80",
        "Golden hour",
    ),
    (
        "https://images.unsplash.com/photo-1511285560929-80b456fea0bc?w=1200&q=80",
        "Celebration",
    ),
    (
        "https://images.unsplash.com/photo-1469371670807-013ccf25f16a?w=1200&q=80",
        "Getting ready",
    ),
];

struct DemoGift {
    title: &'static str,
    description: &'static str,
    link: &'static str,
    image_url: &'static str,
    item_type: GiftItemType,
}

const GIFTS_DATA: &[DemoGift] = &[
    DemoGift {
        title: "Registry - Home Store",
        description: "Browse our registry at the home store",
        link: "https://www.example.com/registry",
        image_url: "https://images.unsplash.com/photo-1607082349566-187342175e2f?w=400&q=80",
        item_type: GiftItemType::External,
    },
    DemoGift {
        title: "Honeymoon Fund",
        description: "Help us make our dream honeymoon happen",
        link: "",
        image_url: "https://images.unsplash.com/photo-1469854523086-cc02fe5d8800?w=400&q=80",
        item_type: GiftItemType::Card,
    },
    DemoGift {
        title: "New Home Fund",
        description: "Contribute to our first home together",
        link: "",
        image_url: "https://images.unsplash.com/photo-1484154218962-a197022b5858?w=400&q=80",
        item_type: GiftItemType::Card,
    },
];

/// Rows actually inserted per collection.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SeedSummary {
    pub home_content: u64,
    pub story_sections: u64,
    pub story_images: u64,
    pub info_sections: u64,
    pub timeline_events: u64,
    pub gallery_images: u64,
    pub gift_items: u64,
}

impl SeedSummary {
    pub fn total(&self) -> u64 {
        self.home_content
            + self.story_sections
            + self.story_images
            + self.info_sections
            + self.timeline_events
            + self.gallery_images
            + self.gift_items
    }
}

async fn exists(
    conn: &mut SqliteConnection,
    sql: &str,
    keys: &[&str],
) -> Result<bool, sqlx::Error> {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    for key in keys {
        query = query.bind(*key);
    }
    Ok(query.fetch_optional(conn).await?.is_some())
}

/// Insert the demo content in one transaction.
pub async fn seed_demo(pool: &SqlitePool) -> Result<SeedSummary, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    let mut home = home::get_or_create_default(&mut *tx).await?;
    home.hero_text = Some(DEFAULT_HERO_TEXT.to_string());
    home.subtitle = Some(DEFAULT_SUBTITLE.to_string());
    home.wedding_date = NaiveDate::from_ymd_opt(2025, 6, 15);
    home.hero_image_url = Some(DEMO_HERO_IMAGE.to_string());
    home::write(&mut *tx, &home).await?;
    summary.home_content = 1;

    for &(title, content) in STORY_SECTIONS_DATA {
        if exists(&mut *tx, "SELECT id FROM story_sections WHERE title = ?", &[title]).await? {
            continue;
        }
        let order = STORY_SECTIONS.next_order(&mut *tx).await?;
        sqlx::query("INSERT INTO story_sections (title, content, sort_order) VALUES (?, ?, ?)")
            .bind(title)
            .bind(content)
            .bind(order)
            .execute(&mut *tx)
            .await?;
        summary.story_sections += 1;
    }

    for &(url, caption) in STORY_IMAGES_DATA {
        if exists(&mut *tx, "SELECT id FROM story_images WHERE image_url = ?", &[url]).await? {
            continue;
        }
        let order = STORY_IMAGES.next_order(&mut *tx).await?;
        sqlx::query("INSERT INTO story_images (image_url, caption, sort_order) VALUES (?, ?, ?)")
            .bind(url)
            .bind(caption)
            .bind(order)
            .execute(&mut *tx)
            .await?;
        summary.story_images += 1;
    }

    for info in INFO_SECTIONS_DATA {
        let sql = "SELECT id FROM wedding_info_sections WHERE section_type = ?";
        if exists(&mut *tx, sql, &[info.section_type]).await? {
            continue;
        }
        let order = INFO_SECTIONS.next_order(&mut *tx).await?;
        sqlx::query(
            "INSERT INTO wedding_info_sections (title, description, icon, section_type, sort_order) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(info.title)
        .bind(info.description)
        .bind(info.icon)
        .bind(info.section_type)
        .bind(order)
        .execute(&mut *tx)
        .await?;
        summary.info_sections += 1;
    }

    for &(hour, minute, title, description, icon) in TIMELINE_DATA {
        let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
            continue;
        };
        let taken: Option<i64> =
            sqlx::query_scalar("SELECT id FROM timeline_events WHERE title = ? AND time = ?")
                .bind(title)
                .bind(time)
                .fetch_optional(&mut *tx)
                .await?;
        if taken.is_some() {
            continue;
        }
        let order = TIMELINE_EVENTS.next_order(&mut *tx).await?;
        sqlx::query(
            "INSERT INTO timeline_events (time, title, description, icon, sort_order) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(time)
        .bind(title)
        .bind(description)
        .bind(icon)
        .bind(order)
        .execute(&mut *tx)
        .await?;
        summary.timeline_events += 1;
    }

    for &(url, caption) in GALLERY_DATA {
        if exists(&mut *tx, "SELECT id FROM gallery_images WHERE image_url = ?", &[url]).await? {
            continue;
        }
        let order = GALLERY_IMAGES.next_order(&mut *tx).await?;
        sqlx::query("INSERT INTO gallery_images (image_url, caption, sort_order) VALUES (?, ?, ?)")
            .bind(url)
            .bind(caption)
            .bind(order)
            .execute(&mut *tx)
            .await?;
        summary.gallery_images += 1;
    }

    for gift in GIFTS_DATA {
        if exists(&mut *tx, "SELECT id FROM gift_items WHERE title = ?", &[gift.title]).await? {
            continue;
        }
        let order = GIFT_ITEMS.next_order(&mut *tx).await?;
        sqlx::query(
            "INSERT INTO gift_items (title, description, link, image_url, item_type, sort_order) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(gift.title)
        .bind(gift.description)
        .bind(gift.link)
        .bind(gift.image_url)
        .bind(gift.item_type)
        .bind(order)
        .execute(&mut *tx)
        .await?;
        summary.gift_items += 1;
    }

    tx.commit().await?;
    tracing::info!(added = summary.total(), summary = ?summary, "demo content seeded");
    Ok(summary)
}

/// Remove all site content except RSVPs and the admin, and reset the home
/// page. Returns the number of deleted rows.
pub async fn clear_demo(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut deleted = 0;

    // story images first so no row points at a deleted section mid-way
    for table in [
        "gallery_images",
        "gift_items",
        "timeline_events",
        "story_images",
        "story_sections",
        "wedding_info_sections",
    ] {
        deleted += sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    let mut home = home::get_or_create_default(&mut *tx).await?;
    home.hero_text = Some(DEFAULT_HERO_TEXT.to_string());
    home.subtitle = Some(DEFAULT_SUBTITLE.to_string());
    home.wedding_date = None;
    home.hero_image_url = None;
    home::write(&mut *tx, &home).await?;

    tx.commit().await?;
    tracing::info!(deleted, "demo content cleared");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewRsvp;
    use crate::db::{gallery, rsvp, test_pool};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = test_pool().await;
        let first = seed_demo(&pool).await.unwrap();
        assert_eq!(first.story_sections, STORY_SECTIONS_DATA.len() as u64);
        assert_eq!(first.gift_items, GIFTS_DATA.len() as u64);

        let second = seed_demo(&pool).await.unwrap();
        assert_eq!(second.total(), 1, "only the home row is rewritten");

        let home = home::get(&pool).await.unwrap();
        assert_eq!(home.hero_image_url.as_deref(), Some(DEMO_HERO_IMAGE));
        assert_eq!(gallery::list(&pool).await.unwrap().len(), GALLERY_DATA.len());
    }

    #[tokio::test]
    async fn test_seed_appends_after_existing_content() {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO gallery_images (image_url, sort_order) VALUES ('mine.jpg', 0)")
            .execute(&pool)
            .await
            .unwrap();
        seed_demo(&pool).await.unwrap();

        let images = gallery::list(&pool).await.unwrap();
        assert_eq!(images[0].image_url, "mine.jpg");
        assert_eq!(images.len(), GALLERY_DATA.len() + 1);
    }

    #[tokio::test]
    async fn test_clear_keeps_rsvps_and_resets_home() {
        let pool = test_pool().await;
        let seeded = seed_demo(&pool).await.unwrap();
        rsvp::create(
            &pool,
            NewRsvp {
                guest_name: "Ana".into(),
                email: "ana@example.com".into(),
                num_attendees: 2,
                dietary_restrictions: None,
                message: None,
            },
        )
        .await
        .unwrap();

        let deleted = clear_demo(&pool).await.unwrap();
        assert_eq!(deleted, seeded.total() - seeded.home_content);

        assert_eq!(rsvp::list(&pool).await.unwrap().len(), 1);
        let home = home::get(&pool).await.unwrap();
        assert_eq!(home.wedding_date, None);
        assert_eq!(home.hero_image_url, None);
        assert_eq!(home.hero_text.as_deref(), Some(DEFAULT_HERO_TEXT));
    }
}
