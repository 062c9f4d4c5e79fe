use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Generation constraints stored per user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub allergies: Vec<String>,
    pub dietary_preferences: Vec<String>,
}

impl Profile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }
}

/// A user without a profile row has no constraints.
pub async fn get_or_default(db: &PgPool, user_id: Uuid) -> anyhow::Result<Profile> {
    let row = sqlx::query_as::<_, Profile>(
        r#"
        SELECT user_id, allergies, dietary_preferences
          FROM profiles
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get profile")?;
    Ok(row.unwrap_or_else(|| Profile::empty(user_id)))
}

pub async fn upsert(db: &PgPool, profile: &Profile) -> anyhow::Result<Profile> {
    let row = sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (user_id, allergies, dietary_preferences)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
           SET allergies = EXCLUDED.allergies,
               dietary_preferences = EXCLUDED.dietary_preferences,
               updated_at = now()
        RETURNING user_id, allergies, dietary_preferences
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.allergies)
    .bind(&profile.dietary_preferences)
    .fetch_one(db)
    .await
    .context("upsert profile")?;
    Ok(row)
}
