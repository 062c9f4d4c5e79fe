//! Turns raw model text into [`Recipe`] values.
//!
//! The model is asked for a JSON array but may wrap it in prose, drop fields
//! or use loose types. Extraction takes the largest bracketed span; each
//! element is then validated and defaulted independently so one bad element
//! never sinks the batch.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::cache::cache_key;
use super::model::{DeepInfo, IngredientDetail, Nutrition, Recipe};

/// Values used when the model leaves a field out or sends garbage.
pub mod defaults {
    pub const COOKING_TIME_MIN: i32 = 30;
    pub const NUTRIENT: f64 = 0.0;
    pub const AMOUNT: &str = "";
}

lazy_static! {
    // First `[` or `{` through the last `]` or `}`.
    static ref JSON_SPAN_RE: Regex = Regex::new(r"(?s)[\[{].*[\]}]").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
    static ref STEP_PREFIX_RE: Regex = Regex::new(r"^\s*\d+\s*[.)]\s*").unwrap();
}

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("could not parse model response: {0}")]
    Parse(String),

    #[error("model response contained no recipes")]
    EmptyResult,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("element is not an object")]
    NotAnObject,

    #[error("missing title")]
    MissingTitle,

    #[error("missing main_ingredients")]
    MissingMainIngredients,
}

#[derive(Debug)]
pub enum ElementOutcome {
    Accepted(Recipe),
    Skipped(SkipReason),
}

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Accepted recipes in the order the model emitted them.
    pub recipes: Vec<Recipe>,
    /// Index in the decoded array and why it was dropped.
    pub skipped: Vec<(usize, SkipReason)>,
}

impl NormalizedBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

pub fn extract_json_span(raw: &str) -> Option<&str> {
    JSON_SPAN_RE.find(raw).map(|m| m.as_str())
}

/// Decode the raw text and normalize every element. `servings` always comes
/// from the caller, never from the model.
pub fn normalize_response(raw: &str, servings: u32) -> Result<NormalizedBatch, NormalizeError> {
    let span = extract_json_span(raw)
        .ok_or_else(|| NormalizeError::Parse("no JSON array or object found".into()))?;
    let decoded: Value =
        serde_json::from_str(span).map_err(|e| NormalizeError::Parse(e.to_string()))?;

    let elements = match decoded {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("recipes") {
            Some(Value::Array(items)) => items.clone(),
            _ => vec![Value::Object(obj)],
        },
        other => {
            return Err(NormalizeError::Parse(format!(
                "expected a JSON array, got {other}"
            )))
        }
    };
    if elements.is_empty() {
        return Err(NormalizeError::EmptyResult);
    }

    let now = OffsetDateTime::now_utc();
    let servings = i32::try_from(servings).unwrap_or(i32::MAX);
    let mut batch = NormalizedBatch::default();
    for (index, element) in elements.iter().enumerate() {
        match normalize_element(element, servings, now) {
            ElementOutcome::Accepted(recipe) => batch.recipes.push(recipe),
            ElementOutcome::Skipped(reason) => {
                warn!(index, %reason, "skipping model recipe");
                batch.skipped.push((index, reason));
            }
        }
    }
    debug!(
        accepted = batch.recipes.len(),
        skipped = batch.skipped_count(),
        "normalized model response"
    );
    Ok(batch)
}

pub fn normalize_element(element: &Value, servings: i32, now: OffsetDateTime) -> ElementOutcome {
    let Some(obj) = element.as_object() else {
        return ElementOutcome::Skipped(SkipReason::NotAnObject);
    };

    let title = match field(obj, &["title", "name"]).and_then(text) {
        Some(t) => t,
        None => return ElementOutcome::Skipped(SkipReason::MissingTitle),
    };
    let main_ingredients = cache_key(
        &field(obj, &["main_ingredients", "mainIngredients"])
            .map(string_list)
            .unwrap_or_default(),
    );
    if main_ingredients.is_empty() {
        return ElementOutcome::Skipped(SkipReason::MissingMainIngredients);
    }

    let deep_info = field(obj, &["deep_info", "deepInfo"])
        .and_then(Value::as_object)
        .map(deep_info)
        .filter(|d| !d.is_empty());

    ElementOutcome::Accepted(Recipe {
        id: Uuid::new_v4(),
        title,
        main_ingredients,
        theme_tags: field(obj, &["theme_tags", "themeTags"])
            .map(string_list)
            .unwrap_or_default(),
        ingredients_detail: field(obj, &["ingredients", "ingredients_detail"])
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(ingredient_detail).collect())
            .unwrap_or_default(),
        instructions: field(obj, &["steps", "instructions"])
            .and_then(Value::as_array)
            .map(|steps| flatten_steps(steps))
            .unwrap_or_default(),
        nutrition: field(obj, &["nutrition"])
            .and_then(Value::as_object)
            .map(nutrition)
            .unwrap_or_default(),
        deep_info,
        cooking_time_minutes: field(obj, &["cooking_time_min", "cooking_time", "cookingTime"])
            .and_then(number)
            .map(|n| n.round())
            .filter(|n| *n >= 1.0 && *n <= i32::MAX as f64)
            .map(|n| n as i32)
            .unwrap_or(defaults::COOKING_TIME_MIN),
        servings,
        created_at: now,
        updated_at: now,
    })
}

/// `"<n>. <action> (tip: <tip>)"`, or without the tip suffix when absent.
pub fn render_step(step_no: u64, action: &str, tip: Option<&str>) -> String {
    match tip {
        Some(tip) => format!("{step_no}. {action} (tip: {tip})"),
        None => format!("{step_no}. {action}"),
    }
}

fn flatten_steps(steps: &[Value]) -> Vec<String> {
    steps
        .iter()
        .enumerate()
        .filter_map(|(i, step)| {
            let fallback_no = i as u64 + 1;
            match step {
                Value::String(s) => {
                    let action = STEP_PREFIX_RE.replace(s.trim(), "");
                    (!action.is_empty()).then(|| render_step(fallback_no, &action, None))
                }
                Value::Object(obj) => {
                    let action = field(obj, &["action", "description", "text"]).and_then(text)?;
                    let step_no = field(obj, &["step_no", "step", "stepNo"])
                        .and_then(number)
                        .filter(|n| *n >= 1.0)
                        .map(|n| n as u64)
                        .unwrap_or(fallback_no);
                    let tip = field(obj, &["tip"]).and_then(text);
                    Some(render_step(step_no, &action, tip.as_deref()))
                }
                _ => None,
            }
        })
        .collect()
}

fn ingredient_detail(value: &Value) -> Option<IngredientDetail> {
    match value {
        Value::String(_) => text(value).map(|name| IngredientDetail {
            name,
            amount: defaults::AMOUNT.to_string(),
            category: None,
            main_or_sub: None,
        }),
        Value::Object(obj) => Some(IngredientDetail {
            name: field(obj, &["name"]).and_then(text)?,
            amount: field(obj, &["amount", "quantity"])
                .and_then(text)
                .unwrap_or_else(|| defaults::AMOUNT.to_string()),
            category: field(obj, &["category"]).and_then(text),
            main_or_sub: field(obj, &["main_or_sub", "mainOrSub"]).and_then(text),
        }),
        _ => None,
    }
}

fn nutrition(obj: &Map<String, Value>) -> Nutrition {
    let get = |names: &[&str]| {
        field(obj, names)
            .and_then(number)
            .map(|n| n.max(0.0))
            .unwrap_or(defaults::NUTRIENT)
    };
    Nutrition {
        calories: get(&["calories", "kcal"]),
        protein: get(&["protein"]),
        fat: get(&["fat"]),
        carbohydrates: get(&["carbohydrates", "carbs"]),
    }
}

fn deep_info(obj: &Map<String, Value>) -> DeepInfo {
    let substitutions = match field(obj, &["substitutions"]) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(o) => {
                    let parts: Vec<String> = o.values().filter_map(text).collect();
                    (!parts.is_empty()).then(|| parts.join(" → "))
                }
                other => text(other),
            })
            .collect(),
        Some(other) => string_list(other),
        None => Vec::new(),
    };
    DeepInfo {
        substitutions,
        tips: field(obj, &["tips"]).map(string_list).unwrap_or_default(),
        difficulty: field(obj, &["difficulty"]).and_then(text),
        chef_kick: field(obj, &["chef_kick", "chefKick"]).and_then(text),
        storage: field(obj, &["storage"]).and_then(text),
    }
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|n| obj.get(*n))
        .filter(|v| !v.is_null())
}

/// Non-empty trimmed string; numbers and booleans are stringified.
fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => NUMBER_RE.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Array of scalars, or a comma separated string.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recipe_json(title: &str) -> Value {
        json!({
            "title": title,
            "main_ingredients": ["양파", "감자"],
            "theme_tags": ["한식", "밑반찬", "간단"],
            "ingredients": [
                {"name": "감자", "amount": "2개", "category": "vegetable", "main_or_sub": "main"},
                {"name": "소금", "amount": 1, "main_or_sub": "sub"},
                {"amount": "nameless"}
            ],
            "steps": [
                {"step_no": 1, "action": "감자를 썬다"},
                {"step_no": 2, "action": "볶는다", "tip": "센 불"}
            ],
            "nutrition": {"calories": 310, "protein": "7g", "fat": 5.5, "carbohydrates": 52},
            "cooking_time_min": 20,
            "servings": 9
        })
    }

    #[test]
    fn extracts_largest_bracketed_span_from_prose() {
        let raw = "다음은 추천입니다:\n```json\n[{\"a\": [1]}, {\"b\": 2}]\n```\n맛있게 드세요!";
        assert_eq!(
            extract_json_span(raw),
            Some("[{\"a\": [1]}, {\"b\": 2}]")
        );
        assert_eq!(extract_json_span("no json here"), None);
    }

    #[test]
    fn prose_without_brackets_is_parse_error() {
        let err = normalize_response("죄송합니다, 레시피를 만들 수 없습니다.", 2).unwrap_err();
        assert!(matches!(err, NormalizeError::Parse(_)));
    }

    #[test]
    fn broken_json_is_parse_error() {
        let err = normalize_response("[{\"title\": \"감자\",]", 2).unwrap_err();
        assert!(matches!(err, NormalizeError::Parse(_)));
    }

    #[test]
    fn empty_array_is_empty_result() {
        assert_eq!(
            normalize_response("결과: []", 2).unwrap_err(),
            NormalizeError::EmptyResult
        );
    }

    #[test]
    fn normalizes_full_element() {
        let raw = json!([recipe_json("감자볶음")]).to_string();
        let batch = normalize_response(&raw, 2).unwrap();
        assert_eq!(batch.recipes.len(), 1);
        let r = &batch.recipes[0];
        assert_eq!(r.title, "감자볶음");
        assert_eq!(r.main_ingredients, vec!["감자", "양파"]);
        assert_eq!(r.servings, 2);
        assert_eq!(r.cooking_time_minutes, 20);
        assert_eq!(r.ingredients_detail.len(), 2);
        assert_eq!(r.ingredients_detail[1].amount, "1");
        assert_eq!(
            r.instructions,
            vec!["1. 감자를 썬다", "2. 볶는다 (tip: 센 불)"]
        );
        assert_eq!(r.nutrition.protein, 7.0);
        assert_eq!(r.nutrition.fat, 5.5);
        assert!(r.deep_info.is_none());
        assert_eq!(r.created_at, r.updated_at);
    }

    #[test]
    fn missing_nutrition_defaults_to_zero() {
        let mut element = recipe_json("된장찌개");
        element.as_object_mut().unwrap().remove("nutrition");
        let batch = normalize_response(&json!([element]).to_string(), 2).unwrap();
        assert_eq!(
            batch.recipes[0].nutrition,
            Nutrition {
                calories: 0.0,
                protein: 0.0,
                fat: 0.0,
                carbohydrates: 0.0
            }
        );
    }

    #[test]
    fn minimal_element_gets_defaults() {
        let raw = r#"[{"title": "계란말이", "main_ingredients": ["계란"], "nutrition": {"calories": -40}}]"#;
        let r = &normalize_response(raw, 4).unwrap().recipes[0];
        assert!(r.theme_tags.is_empty());
        assert!(r.ingredients_detail.is_empty());
        assert!(r.instructions.is_empty());
        assert_eq!(r.cooking_time_minutes, defaults::COOKING_TIME_MIN);
        assert_eq!(r.nutrition.calories, 0.0);
        assert_eq!(r.servings, 4);
    }

    #[test]
    fn partial_failure_skips_only_invalid_elements() {
        let mut broken = recipe_json("x");
        broken.as_object_mut().unwrap().remove("title");
        let raw = json!([recipe_json("감자전"), broken, recipe_json("감자국")]).to_string();
        let batch = normalize_response(&raw, 2).unwrap();
        assert_eq!(batch.recipes.len(), 2);
        assert_eq!(batch.skipped_count(), 1);
        assert_eq!(batch.skipped, vec![(1, SkipReason::MissingTitle)]);
        assert_eq!(batch.recipes[0].title, "감자전");
        assert_eq!(batch.recipes[1].title, "감자국");
    }

    #[test]
    fn all_invalid_is_not_an_error_here() {
        let raw = r#"[{"title": "  "}, {"title": "찜", "main_ingredients": []}, 7]"#;
        let batch = normalize_response(raw, 2).unwrap();
        assert!(batch.recipes.is_empty());
        assert_eq!(
            batch.skipped,
            vec![
                (0, SkipReason::MissingTitle),
                (1, SkipReason::MissingMainIngredients),
                (2, SkipReason::NotAnObject),
            ]
        );
    }

    #[test]
    fn wrapped_object_and_single_object_are_accepted() {
        let wrapped = json!({"recipes": [recipe_json("카레"), recipe_json("스튜")]}).to_string();
        assert_eq!(normalize_response(&wrapped, 2).unwrap().recipes.len(), 2);

        let single = recipe_json("볶음밥").to_string();
        assert_eq!(normalize_response(&single, 2).unwrap().recipes.len(), 1);
    }

    #[test]
    fn string_steps_are_renumbered_without_double_prefix() {
        let raw = r#"[{"title": "라면", "main_ingredients": ["라면"], "steps": ["1. 물을 끓인다", "면을 넣는다"]}]"#;
        let r = &normalize_response(raw, 1).unwrap().recipes[0];
        assert_eq!(r.instructions, vec!["1. 물을 끓인다", "2. 면을 넣는다"]);
    }

    #[test]
    fn deep_info_is_kept_when_present() {
        let mut element = recipe_json("잡채");
        element.as_object_mut().unwrap().insert(
            "deep_info".into(),
            json!({
                "substitutions": [{"from": "당면", "to": "쌀국수"}],
                "tips": "미리 불려두세요",
                "difficulty": "보통",
                "chefKick": "참기름은 마지막에"
            }),
        );
        let r = &normalize_response(&json!([element]).to_string(), 2).unwrap().recipes[0];
        let info = r.deep_info.as_ref().unwrap();
        assert_eq!(info.substitutions, vec!["당면 → 쌀국수"]);
        assert_eq!(info.tips, vec!["미리 불려두세요"]);
        assert_eq!(info.difficulty.as_deref(), Some("보통"));
        assert_eq!(info.chef_kick.as_deref(), Some("참기름은 마지막에"));
        assert!(info.storage.is_none());
    }

    #[test]
    fn render_step_formats() {
        assert_eq!(render_step(3, "굽는다", None), "3. 굽는다");
        assert_eq!(render_step(3, "굽는다", Some("뒤집기")), "3. 굽는다 (tip: 뒤집기)");
    }
}
