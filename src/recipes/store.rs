use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{types::Json, PgExecutor, PgPool};
use uuid::Uuid;

use super::model::{Recipe, RecipeRow};

pub(crate) const RECIPE_COLUMNS: &str = "id, user_id, title, main_ingredients, theme_tags, \
     ingredients_detail, instructions, nutrition, deep_info, cooking_time_minutes, servings, \
     created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Skipped,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Success => "success",
            BatchStatus::Skipped => "skipped",
            BatchStatus::Failed => "failed",
        }
    }
}

/// Audit row written by the batch generator for every dish it handles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchLogEntry {
    pub ingredient: String,
    pub dish_name: Option<String>,
    pub status: BatchStatus,
    pub reason: Option<String>,
}

/// What the generation pipeline needs from the recipe store.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// The owner's recipes whose `main_ingredients` contain every name in
    /// `key`, newest first.
    async fn matching_by_owner(
        &self,
        user_id: Uuid,
        key: &[String],
        limit: i64,
    ) -> anyhow::Result<Vec<Recipe>>;

    /// Insert all recipes or none of them.
    async fn insert_batch(&self, owner: Option<Uuid>, recipes: &[Recipe]) -> anyhow::Result<()>;

    async fn insert_one(&self, owner: Option<Uuid>, recipe: &Recipe) -> anyhow::Result<()>;

    /// Exact title match against the whole catalog.
    async fn title_exists(&self, title: &str) -> anyhow::Result<bool>;

    async fn record_batch_log(&self, entry: &BatchLogEntry) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn insert_recipe<'e, E: PgExecutor<'e>>(
    ex: E,
    owner: Option<Uuid>,
    r: &Recipe,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO generated_recipes
            (id, user_id, title, main_ingredients, theme_tags, ingredients_detail,
             instructions, nutrition, deep_info, cooking_time_minutes, servings,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(r.id)
    .bind(owner)
    .bind(&r.title)
    .bind(&r.main_ingredients)
    .bind(&r.theme_tags)
    .bind(Json(&r.ingredients_detail))
    .bind(&r.instructions)
    .bind(Json(&r.nutrition))
    .bind(r.deep_info.as_ref().map(Json))
    .bind(r.cooking_time_minutes)
    .bind(r.servings)
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(ex)
    .await
    .with_context(|| format!("insert recipe {}", r.title))?;
    Ok(())
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn matching_by_owner(
        &self,
        user_id: Uuid,
        key: &[String],
        limit: i64,
    ) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM generated_recipes \
             WHERE user_id = $1 AND main_ingredients @> $2 \
             ORDER BY created_at DESC LIMIT $3"
        ))
        .bind(user_id)
        .bind(key)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("cache lookup by owner")?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn insert_batch(&self, owner: Option<Uuid>, recipes: &[Recipe]) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        for r in recipes {
            insert_recipe(&mut *tx, owner, r).await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn insert_one(&self, owner: Option<Uuid>, recipe: &Recipe) -> anyhow::Result<()> {
        insert_recipe(&self.db, owner, recipe).await
    }

    async fn title_exists(&self, title: &str) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM generated_recipes WHERE title = $1)",
        )
        .bind(title)
        .fetch_one(&self.db)
        .await
        .context("check recipe title")?;
        Ok(exists)
    }

    async fn record_batch_log(&self, entry: &BatchLogEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recipe_generation_logs (ingredient, dish_name, status, reason)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.ingredient)
        .bind(&entry.dish_name)
        .bind(entry.status.as_str())
        .bind(&entry.reason)
        .execute(&self.db)
        .await
        .context("insert generation log")?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::recipes::cache::is_superset;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store; rows are kept in insertion order.
    #[derive(Default)]
    pub struct FakeRecipeStore {
        pub rows: Mutex<Vec<(Option<Uuid>, Recipe)>>,
        pub logs: Mutex<Vec<BatchLogEntry>>,
        pub insert_calls: AtomicUsize,
        pub fail_inserts: AtomicBool,
        pub fail_reads: AtomicBool,
    }

    impl FakeRecipeStore {
        pub fn seeded(owner: Uuid, recipes: Vec<Recipe>) -> Self {
            let store = Self::default();
            store
                .rows
                .lock()
                .unwrap()
                .extend(recipes.into_iter().map(|r| (Some(owner), r)));
            store
        }

        pub fn titles(&self) -> Vec<String> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .map(|(_, r)| r.title.clone())
                .collect()
        }
    }

    #[async_trait]
    impl RecipeStore for FakeRecipeStore {
        async fn matching_by_owner(
            &self,
            user_id: Uuid,
            key: &[String],
            limit: i64,
        ) -> anyhow::Result<Vec<Recipe>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                anyhow::bail!("store unavailable");
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|(owner, r)| {
                    *owner == Some(user_id) && is_superset(&r.main_ingredients, key)
                })
                .take(limit as usize)
                .map(|(_, r)| r.clone())
                .collect())
        }

        async fn insert_batch(
            &self,
            owner: Option<Uuid>,
            recipes: &[Recipe],
        ) -> anyhow::Result<()> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_inserts.load(Ordering::SeqCst) {
                anyhow::bail!("constraint violation");
            }
            self.rows
                .lock()
                .unwrap()
                .extend(recipes.iter().cloned().map(|r| (owner, r)));
            Ok(())
        }

        async fn insert_one(&self, owner: Option<Uuid>, recipe: &Recipe) -> anyhow::Result<()> {
            self.insert_batch(owner, std::slice::from_ref(recipe)).await
        }

        async fn title_exists(&self, title: &str) -> anyhow::Result<bool> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .any(|(_, r)| r.title == title))
        }

        async fn record_batch_log(&self, entry: &BatchLogEntry) -> anyhow::Result<()> {
            self.logs.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }
}
