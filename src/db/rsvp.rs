//! Guest RSVPs. Written once by the public form, read by the admin.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::{NewRsvp, Rsvp};

const COLUMNS: &str =
    "id, guest_name, email, num_attendees, dietary_restrictions, message, created_at";

/// Store a submission. The input is normalized here so every caller gets the
/// same attendee and blank-text rules.
pub async fn create(pool: &SqlitePool, new: NewRsvp) -> Result<Rsvp, sqlx::Error> {
    let new = new.normalized();

    let mut tx = pool.begin().await?;
    let rsvp = sqlx::query_as::<_, Rsvp>(&format!(
        "INSERT INTO rsvps \
         (guest_name, email, num_attendees, dietary_restrictions, message, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
        COLUMNS
    ))
    .bind(&new.guest_name)
    .bind(&new.email)
    .bind(new.num_attendees)
    .bind(&new.dietary_restrictions)
    .bind(&new.message)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(rsvp_id = rsvp.id, attendees = rsvp.num_attendees, "rsvp received");
    Ok(rsvp)
}

/// Newest first.
pub async fn list(pool: &SqlitePool) -> Result<Vec<Rsvp>, sqlx::Error> {
    sqlx::query_as::<_, Rsvp>(&format!(
        "SELECT {} FROM rsvps ORDER BY created_at DESC, id DESC",
        COLUMNS
    ))
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn submission(name: &str, attendees: i64, message: Option<&str>) -> NewRsvp {
        NewRsvp {
            guest_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            num_attendees: attendees,
            dietary_restrictions: None,
            message: message.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_zero_attendees_and_blank_message_are_normalized() {
        let pool = test_pool().await;
        let rsvp = create(&pool, submission("Ana", 0, Some(""))).await.unwrap();
        assert_eq!(rsvp.num_attendees, 1);
        assert_eq!(rsvp.message, None);

        let stored: (i64, Option<String>) =
            sqlx::query_as("SELECT num_attendees, message FROM rsvps WHERE id = ?")
                .bind(rsvp.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(stored, (1, None));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let pool = test_pool().await;
        let first = create(&pool, submission("Ana", 2, None)).await.unwrap();
        let second = create(&pool, submission("Rui", 1, Some("See you there"))).await.unwrap();

        let ids: Vec<i64> = list(&pool).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
