//! Home page content: a single row pinned to id 1.

use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::{HomeContent, HomeContentPatch};

pub const DEFAULT_HERO_TEXT: &str = "Bianca & Joel";
pub const DEFAULT_SUBTITLE: &str = "Join us for our special day";
pub const DEFAULT_TEXT_COLOR: &str = "#8B6F6D";
pub const DEFAULT_NAVBAR_COLOR: &str = "#F8F4EC";

const HOME_ID: i64 = 1;

const COLUMNS: &str = "id, hero_text, hero_image_url, wedding_date, subtitle, text_color, \
     navbar_color, navbar_text_color, accent_color, body_bg_color, body_heading_color, \
     body_text_color, footer_bg_color, footer_text_color";

/// Read the home row, inserting the defaults first if it does not exist yet.
pub async fn get_or_create_default(conn: &mut SqliteConnection) -> Result<HomeContent, sqlx::Error> {
    sqlx::query(
        "INSERT INTO home_content (id, hero_text, subtitle, text_color, navbar_color) \
         VALUES (?, ?, ?, ?, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(HOME_ID)
    .bind(DEFAULT_HERO_TEXT)
    .bind(DEFAULT_SUBTITLE)
    .bind(DEFAULT_TEXT_COLOR)
    .bind(DEFAULT_NAVBAR_COLOR)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, HomeContent>(&format!(
        "SELECT {} FROM home_content WHERE id = ?",
        COLUMNS
    ))
    .bind(HOME_ID)
    .fetch_one(&mut *conn)
    .await
}

pub async fn get(pool: &SqlitePool) -> Result<HomeContent, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    get_or_create_default(&mut conn).await
}

pub async fn update(pool: &SqlitePool, patch: HomeContentPatch) -> Result<HomeContent, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut home = get_or_create_default(&mut tx).await?;
    patch.apply(&mut home);
    write(&mut tx, &home).await?;
    tx.commit().await?;
    Ok(home)
}

/// Restore the default hero text and subtitle, leaving everything else.
pub async fn reset_defaults(pool: &SqlitePool) -> Result<HomeContent, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut home = get_or_create_default(&mut tx).await?;
    home.hero_text = Some(DEFAULT_HERO_TEXT.to_string());
    home.subtitle = Some(DEFAULT_SUBTITLE.to_string());
    write(&mut tx, &home).await?;
    tx.commit().await?;
    Ok(home)
}

pub(crate) async fn write(conn: &mut SqliteConnection, home: &HomeContent) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE home_content SET
            hero_text = ?, hero_image_url = ?, wedding_date = ?, subtitle = ?,
            text_color = ?, navbar_color = ?, navbar_text_color = ?, accent_color = ?,
            body_bg_color = ?, body_heading_color = ?, body_text_color = ?,
            footer_bg_color = ?, footer_text_color = ?
        WHERE id = ?
        "#,
    )
    .bind(&home.hero_text)
    .bind(&home.hero_image_url)
    .bind(home.wedding_date)
    .bind(&home.subtitle)
    .bind(&home.text_color)
    .bind(&home.navbar_color)
    .bind(&home.navbar_text_color)
    .bind(&home.accent_color)
    .bind(&home.body_bg_color)
    .bind(&home.body_heading_color)
    .bind(&home.body_text_color)
    .bind(&home.footer_bg_color)
    .bind(&home.footer_text_color)
    .bind(HOME_ID)
    .execute(conn)
    .await?;
    Ok(())
}
