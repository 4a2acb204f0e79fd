use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Card record in the database. `id` is the internal identifier used for
/// delete and ownership checks; `card_id` is the short public one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub user_id: Uuid,
    pub card_id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image_url: String,
    pub music_url: Option<String>,
    pub music_file_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields of a card before it has been persisted.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image_url: String,
    pub music_url: Option<String>,
    pub music_file_url: Option<String>,
}

impl Card {
    /// All cards, newest first. Display reshaping happens in the service
    /// layer, not here.
    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<Card>> {
        let rows = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, user_id, card_id, title, description, category,
                   image_url, music_url, music_file_url, created_at, updated_at
            FROM cards
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_public_id(db: &PgPool, card_id: &str) -> sqlx::Result<Option<Card>> {
        let row = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, user_id, card_id, title, description, category,
                   image_url, music_url, music_file_url, created_at, updated_at
            FROM cards
            WHERE card_id = $1
            LIMIT 1
            "#,
        )
        .bind(card_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> sqlx::Result<Option<Card>> {
        let row = sqlx::query_as::<_, Card>(
            r#"
            SELECT id, user_id, card_id, title, description, category,
                   image_url, music_url, music_file_url, created_at, updated_at
            FROM cards
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn insert(db: &PgPool, new: &NewCard, card_id: &str) -> sqlx::Result<Card> {
        let row = sqlx::query_as::<_, Card>(
            r#"
            INSERT INTO cards (user_id, card_id, title, description, category,
                               image_url, music_url, music_file_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING id, user_id, card_id, title, description, category,
                      image_url, music_url, music_file_url, created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(card_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.image_url)
        .bind(&new.music_url)
        .bind(&new.music_file_url)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Delete by internal id, scoped to the owner. Deleting a missing or
    /// foreign id affects zero rows and is not an error.
    pub async fn delete_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM cards
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_serializes_nullable_music_fields_as_null() {
        let now = OffsetDateTime::now_utc();
        let card = Card {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            card_id: "A1B2C3".into(),
            title: "t".into(),
            description: "d".into(),
            category: None,
            image_url: "https://x/img.png".into(),
            music_url: None,
            music_file_url: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&card).unwrap();
        assert!(value["music_url"].is_null());
        assert!(value["music_file_url"].is_null());
        assert_eq!(value["image_url"], "https://x/img.png");
    }
}
