use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::services::IngredientCategory;

/// A fridge item.
#[derive(Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: String,
    pub category: IngredientCategory,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct IngredientRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    quantity: String,
    category: String,
    created_at: OffsetDateTime,
}

impl From<IngredientRow> for Ingredient {
    fn from(r: IngredientRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            quantity: r.quantity,
            category: IngredientCategory::parse_lenient(&r.category),
            created_at: r.created_at,
        }
    }
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, IngredientRow>(
        r#"
        SELECT id, user_id, name, quantity, category, created_at
          FROM ingredients
         WHERE user_id = $1
         ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list ingredients")?;
    Ok(rows.into_iter().map(Ingredient::from).collect())
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    quantity: &str,
    category: IngredientCategory,
) -> anyhow::Result<Ingredient> {
    let row = sqlx::query_as::<_, IngredientRow>(
        r#"
        INSERT INTO ingredients (id, user_id, name, quantity, category)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, name, quantity, category, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .bind(quantity)
    .bind(category.as_str())
    .fetch_one(db)
    .await
    .context("insert ingredient")?;
    Ok(row.into())
}

pub async fn update_quantity(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    quantity: &str,
) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, IngredientRow>(
        r#"
        UPDATE ingredients
           SET quantity = $3
         WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, name, quantity, category, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(quantity)
    .fetch_optional(db)
    .await
    .context("update ingredient")?;
    Ok(row.map(Ingredient::from))
}

/// Returns false when nothing matched.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM ingredients WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete ingredient")?;
    Ok(res.rows_affected() > 0)
}
