use serde::{Deserialize, Serialize};

use super::cache::cache_key;
use super::model::{IngredientDetail, IngredientGroups, Nutrition, Recipe};

pub const MAX_SERVINGS: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct GenerateRecipesRequest {
    pub ingredients: Vec<String>,
    #[serde(default = "default_servings")]
    pub servings: u32,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
}
fn default_servings() -> u32 {
    2
}

#[derive(Debug, Serialize)]
pub struct GenerateRecipesResponse {
    pub recipes: Vec<Recipe>,
    pub cached: usize,
    pub generated: usize,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

impl CatalogQuery {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredient_groups: IngredientGroups,
}

#[derive(Debug, Serialize)]
pub struct RelatedRecipes {
    pub by_ingredient: Vec<Recipe>,
    pub by_tag: Vec<Recipe>,
    pub by_cooking_time: Vec<Recipe>,
}

/// Editable fields of a personal recipe copy.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecipeEdit {
    pub title: String,
    pub main_ingredients: Vec<String>,
    #[serde(default)]
    pub theme_tags: Vec<String>,
    #[serde(default)]
    pub ingredients_detail: Vec<IngredientDetail>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub nutrition: Nutrition,
    pub cooking_time_minutes: i32,
    pub servings: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRecipeRequest {
    #[serde(flatten)]
    pub edit: UserRecipeEdit,
    #[serde(default)]
    pub safety_consent: bool,
}

impl UserRecipeEdit {
    /// Validate and normalize in place of the stored representation.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err("title is required".into());
        }
        self.main_ingredients = cache_key(&self.main_ingredients);
        if self.main_ingredients.is_empty() {
            return Err("main_ingredients must not be empty".into());
        }
        if self.cooking_time_minutes < 1 {
            return Err("cooking_time_minutes must be positive".into());
        }
        if self.servings < 1 || self.servings > MAX_SERVINGS as i32 {
            return Err(format!("servings must be between 1 and {MAX_SERVINGS}"));
        }
        let n = &mut self.nutrition;
        for v in [&mut n.calories, &mut n.protein, &mut n.fat, &mut n.carbohydrates] {
            *v = v.max(0.0);
        }
        Ok(self)
    }

    /// Plain text handed to the safety checker.
    pub fn render_text(&self) -> String {
        let mut lines = vec![format!("제목: {}", self.title)];
        lines.push(format!("주재료: {}", self.main_ingredients.join(", ")));
        if !self.ingredients_detail.is_empty() {
            let items: Vec<String> = self
                .ingredients_detail
                .iter()
                .map(|d| format!("{} {}", d.name, d.amount).trim().to_string())
                .collect();
            lines.push(format!("재료: {}", items.join(", ")));
        }
        lines.push("조리 순서:".into());
        lines.extend(self.instructions.iter().cloned());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit() -> UserRecipeEdit {
        serde_json::from_value(serde_json::json!({
            "title": "  나만의 감자전 ",
            "main_ingredients": ["감자", "부침가루", "감자"],
            "ingredients_detail": [{"name": "감자", "amount": "3개"}],
            "instructions": ["1. 감자를 간다", "2. 부친다"],
            "nutrition": {"calories": -5, "protein": 3, "fat": 2, "carbohydrates": 30},
            "cooking_time_minutes": 20,
            "servings": 2
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_valid_edit() {
        let e = edit().normalized().unwrap();
        assert_eq!(e.title, "나만의 감자전");
        assert_eq!(e.main_ingredients, vec!["감자", "부침가루"]);
        assert_eq!(e.nutrition.calories, 0.0);
    }

    #[test]
    fn rejects_invalid_edits() {
        let mut e = edit();
        e.title = " ".into();
        assert!(e.normalized().is_err());

        let mut e = edit();
        e.main_ingredients = vec![];
        assert!(e.normalized().is_err());

        let mut e = edit();
        e.servings = 0;
        assert!(e.normalized().is_err());
    }

    #[test]
    fn rendered_text_contains_steps() {
        let text = edit().normalized().unwrap().render_text();
        assert!(text.contains("제목: 나만의 감자전"));
        assert!(text.contains("감자 3개"));
        assert!(text.ends_with("2. 부친다"));
    }

    #[test]
    fn update_request_flattens_edit() {
        let req: UpdateUserRecipeRequest = serde_json::from_value(serde_json::json!({
            "title": "볶음밥",
            "main_ingredients": ["밥"],
            "cooking_time_minutes": 10,
            "servings": 1,
            "safety_consent": true
        }))
        .unwrap();
        assert!(req.safety_consent);
        assert_eq!(req.edit.title, "볶음밥");
    }

    #[test]
    fn generate_request_defaults() {
        let req: GenerateRecipesRequest =
            serde_json::from_str(r#"{"ingredients": ["감자"]}"#).unwrap();
        assert_eq!(req.servings, 2);
        assert!(req.allergies.is_empty());
        assert!(req.theme.is_none());
    }

    #[test]
    fn catalog_query_is_clamped() {
        let q: CatalogQuery = serde_json::from_str(r#"{"limit": 1000, "offset": -3}"#).unwrap();
        assert_eq!(q.clamped(), (100, 0));
    }
}
