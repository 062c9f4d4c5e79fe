use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::dto::UserRecipeEdit;
use super::model::{Recipe, RecipeRow, UserRecipe, UserRecipeRow};
use super::store::RECIPE_COLUMNS;

const USER_RECIPE_COLUMNS: &str = "id, user_id, original_recipe_id, title, main_ingredients, \
     theme_tags, ingredients_detail, instructions, nutrition, deep_info, cooking_time_minutes, \
     servings, safety_consent, safety_check_passed, created_at, updated_at";

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ---- Shared catalog ----

pub async fn list_catalog(
    db: &PgPool,
    query: Option<&str>,
    tag: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Recipe>> {
    let pattern = query.map(|q| format!("%{}%", escape_like(q)));
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM generated_recipes
         WHERE ($1::text IS NULL OR title ILIKE $1)
           AND ($2::text IS NULL OR $2 = ANY(theme_tags))
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4
        "#
    ))
    .bind(pattern)
    .bind(tag)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list catalog")?;
    Ok(rows.into_iter().map(Recipe::from).collect())
}

pub async fn get_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let row = sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM generated_recipes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get recipe")?;
    Ok(row.map(Recipe::from))
}

pub async fn related_by_ingredient(
    db: &PgPool,
    id: Uuid,
    ingredient: &str,
    limit: i64,
) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM generated_recipes
         WHERE id <> $1 AND $2 = ANY(main_ingredients)
         ORDER BY created_at DESC
         LIMIT $3
        "#
    ))
    .bind(id)
    .bind(ingredient)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("related by ingredient")?;
    Ok(rows.into_iter().map(Recipe::from).collect())
}

pub async fn related_by_tag(
    db: &PgPool,
    id: Uuid,
    tag: &str,
    limit: i64,
) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM generated_recipes
         WHERE id <> $1 AND $2 = ANY(theme_tags)
         ORDER BY created_at DESC
         LIMIT $3
        "#
    ))
    .bind(id)
    .bind(tag)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("related by tag")?;
    Ok(rows.into_iter().map(Recipe::from).collect())
}

pub async fn related_by_cooking_time(
    db: &PgPool,
    id: Uuid,
    minutes: i32,
    limit: i64,
) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
          FROM generated_recipes
         WHERE id <> $1
         ORDER BY abs(cooking_time_minutes - $2), created_at DESC
         LIMIT $3
        "#
    ))
    .bind(id)
    .bind(minutes)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("related by cooking time")?;
    Ok(rows.into_iter().map(Recipe::from).collect())
}

// ---- Personal copies ----

pub async fn save_copy(db: &PgPool, user_id: Uuid, r: &Recipe) -> anyhow::Result<UserRecipe> {
    let row = sqlx::query_as::<_, UserRecipeRow>(&format!(
        r#"
        INSERT INTO user_recipes
            (id, user_id, original_recipe_id, title, main_ingredients, theme_tags,
             ingredients_detail, instructions, nutrition, deep_info, cooking_time_minutes,
             servings, safety_consent, safety_check_passed)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, false, true)
        RETURNING {USER_RECIPE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(r.id)
    .bind(&r.title)
    .bind(&r.main_ingredients)
    .bind(&r.theme_tags)
    .bind(Json(&r.ingredients_detail))
    .bind(&r.instructions)
    .bind(Json(&r.nutrition))
    .bind(r.deep_info.as_ref().map(Json))
    .bind(r.cooking_time_minutes)
    .bind(r.servings)
    .fetch_one(db)
    .await
    .context("save recipe copy")?;
    Ok(row.into())
}

pub async fn list_user_recipes(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<UserRecipe>> {
    let rows = sqlx::query_as::<_, UserRecipeRow>(&format!(
        "SELECT {USER_RECIPE_COLUMNS} FROM user_recipes \
         WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list user recipes")?;
    Ok(rows.into_iter().map(UserRecipe::from).collect())
}

pub async fn update_user_recipe(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    edit: &UserRecipeEdit,
    safety_check_passed: bool,
) -> anyhow::Result<Option<UserRecipe>> {
    let row = sqlx::query_as::<_, UserRecipeRow>(&format!(
        r#"
        UPDATE user_recipes
           SET title = $3,
               main_ingredients = $4,
               theme_tags = $5,
               ingredients_detail = $6,
               instructions = $7,
               nutrition = $8,
               cooking_time_minutes = $9,
               servings = $10,
               safety_consent = true,
               safety_check_passed = $11,
               updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {USER_RECIPE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(&edit.title)
    .bind(&edit.main_ingredients)
    .bind(&edit.theme_tags)
    .bind(Json(&edit.ingredients_detail))
    .bind(&edit.instructions)
    .bind(Json(&edit.nutrition))
    .bind(edit.cooking_time_minutes)
    .bind(edit.servings)
    .bind(safety_check_passed)
    .fetch_optional(db)
    .await
    .context("update user recipe")?;
    Ok(row.map(UserRecipe::from))
}

/// Returns false when nothing matched.
pub async fn delete_user_recipe(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM user_recipes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete user recipe")?;
    Ok(res.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("감자"), "감자");
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
    }
}
