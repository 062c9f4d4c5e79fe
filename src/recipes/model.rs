use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDetail {
    pub name: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_or_sub: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeepInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substitutions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chef_kick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

impl DeepInfo {
    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
            && self.tips.is_empty()
            && self.difficulty.is_none()
            && self.chef_kick.is_none()
            && self.storage.is_none()
    }
}

/// A recipe in the shared catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    /// Sorted; doubles as the cache key.
    pub main_ingredients: Vec<String>,
    pub theme_tags: Vec<String>,
    pub ingredients_detail: Vec<IngredientDetail>,
    pub instructions: Vec<String>,
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_info: Option<DeepInfo>,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row shape of `generated_recipes`.
#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub main_ingredients: Vec<String>,
    pub theme_tags: Vec<String>,
    pub ingredients_detail: Json<Vec<IngredientDetail>>,
    pub instructions: Vec<String>,
    pub nutrition: Json<Nutrition>,
    pub deep_info: Option<Json<DeepInfo>>,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            main_ingredients: r.main_ingredients,
            theme_tags: r.theme_tags,
            ingredients_detail: r.ingredients_detail.0,
            instructions: r.instructions,
            nutrition: r.nutrition.0,
            deep_info: r.deep_info.map(|d| d.0),
            cooking_time_minutes: r.cooking_time_minutes,
            servings: r.servings,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A user's personal copy of a catalog recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_recipe_id: Option<Uuid>,
    pub title: String,
    pub main_ingredients: Vec<String>,
    pub theme_tags: Vec<String>,
    pub ingredients_detail: Vec<IngredientDetail>,
    pub instructions: Vec<String>,
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_info: Option<DeepInfo>,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    pub safety_consent: bool,
    pub safety_check_passed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row shape of `user_recipes`.
#[derive(Debug, FromRow)]
pub struct UserRecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_recipe_id: Option<Uuid>,
    pub title: String,
    pub main_ingredients: Vec<String>,
    pub theme_tags: Vec<String>,
    pub ingredients_detail: Json<Vec<IngredientDetail>>,
    pub instructions: Vec<String>,
    pub nutrition: Json<Nutrition>,
    pub deep_info: Option<Json<DeepInfo>>,
    pub cooking_time_minutes: i32,
    pub servings: i32,
    pub safety_consent: bool,
    pub safety_check_passed: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRecipeRow> for UserRecipe {
    fn from(r: UserRecipeRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            original_recipe_id: r.original_recipe_id,
            title: r.title,
            main_ingredients: r.main_ingredients,
            theme_tags: r.theme_tags,
            ingredients_detail: r.ingredients_detail.0,
            instructions: r.instructions,
            nutrition: r.nutrition.0,
            deep_info: r.deep_info.map(|d| d.0),
            cooking_time_minutes: r.cooking_time_minutes,
            servings: r.servings,
            safety_consent: r.safety_consent,
            safety_check_passed: r.safety_check_passed,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Ingredient lines split for display.
#[derive(Debug, Default, Serialize)]
pub struct IngredientGroups {
    pub main: Vec<IngredientDetail>,
    pub sub: Vec<IngredientDetail>,
    pub uncategorized: Vec<IngredientDetail>,
}

pub fn group_ingredients(details: &[IngredientDetail]) -> IngredientGroups {
    let mut groups = IngredientGroups::default();
    for d in details {
        let bucket = match d.main_or_sub.as_deref().map(str::trim) {
            Some("main") | Some("주재료") => &mut groups.main,
            Some("sub") | Some("seasoning") | Some("부재료") | Some("양념") => &mut groups.sub,
            _ => &mut groups.uncategorized,
        };
        bucket.push(d.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(name: &str, main_or_sub: Option<&str>) -> IngredientDetail {
        IngredientDetail {
            name: name.into(),
            amount: "1개".into(),
            category: None,
            main_or_sub: main_or_sub.map(str::to_string),
        }
    }

    #[test]
    fn groups_by_main_or_sub_with_uncategorized_fallback() {
        let groups = group_ingredients(&[
            detail("감자", Some("main")),
            detail("간장", Some("seasoning")),
            detail("참기름", Some("양념")),
            detail("깨", None),
            detail("물", Some("etc")),
        ]);
        assert_eq!(groups.main.len(), 1);
        assert_eq!(groups.sub.len(), 2);
        assert_eq!(groups.uncategorized.len(), 2);
    }

    #[test]
    fn user_recipe_row_keeps_deep_info() {
        let now = OffsetDateTime::now_utc();
        let row = UserRecipeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            original_recipe_id: Some(Uuid::new_v4()),
            title: "감자조림".into(),
            main_ingredients: vec!["감자".into()],
            theme_tags: vec![],
            ingredients_detail: Json(vec![detail("감자", Some("main"))]),
            instructions: vec!["1. 졸인다".into()],
            nutrition: Json(Nutrition::default()),
            deep_info: Some(Json(DeepInfo {
                tips: vec!["약불로 졸인다".into()],
                storage: Some("냉장 3일".into()),
                ..Default::default()
            })),
            cooking_time_minutes: 25,
            servings: 2,
            safety_consent: false,
            safety_check_passed: true,
            created_at: now,
            updated_at: now,
        };
        let copy = UserRecipe::from(row);
        let info = copy.deep_info.as_ref().unwrap();
        assert_eq!(info.tips, vec!["약불로 졸인다"]);
        let json = serde_json::to_value(&copy).unwrap();
        assert_eq!(json["deep_info"]["storage"], "냉장 3일");
    }

    #[test]
    fn deep_info_emptiness() {
        assert!(DeepInfo::default().is_empty());
        let info = DeepInfo {
            difficulty: Some("쉬움".into()),
            ..Default::default()
        };
        assert!(!info.is_empty());
    }
}
