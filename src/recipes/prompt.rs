//! Recipe generation prompt.

/// Constraints for one generation request.
#[derive(Debug, Clone, Default)]
pub struct RecipeRequest {
    /// Owned ingredients, already sorted by the caller.
    pub ingredients: Vec<String>,
    pub servings: u32,
    pub theme: String,
    pub allergies: Vec<String>,
    pub dietary_preferences: Vec<String>,
    /// Number of recipes the model must return.
    pub count: usize,
}

const ROLE: &str = "당신은 한국 가정식에 정통한 전문 셰프이자 영양사입니다. \
사용자의 냉장고에 있는 재료를 바탕으로 실제로 집에서 만들 수 있는 레시피를 추천합니다.";

const REASONING: &[&str] = &[
    "보유 재료 중 핵심 재료로 만들 수 있는 대표적인 요리 후보를 먼저 떠올리세요.",
    "각 후보 요리의 표준 레시피(정석 재료와 조리 순서)를 재구성하세요.",
    "표준 레시피의 재료를 보유 재료와 대조하세요. 보유 재료를 억지로 모두 넣지 말고, 부족한 재료는 그대로 재료 목록에 포함해 사용자가 추가로 구매할 수 있게 하세요.",
    "서로 겹치지 않는 요리를 고르고, 조리 단계는 초보자도 따라 할 수 있게 구체적으로 작성하세요.",
];

const SCHEMA: &str = r#"{
  "title": "요리 이름",
  "main_ingredients": ["이 요리에 쓰이는 보유 재료 이름"],
  "theme_tags": ["태그1", "태그2", "태그3"],
  "ingredients": [
    {"name": "재료명", "amount": "분량", "category": "meat|vegetable|seafood|grain|dairy|seasoning|fruit|other", "main_or_sub": "main|sub"}
  ],
  "steps": [
    {"step_no": 1, "action": "조리 동작", "tip": "선택 사항"}
  ],
  "nutrition": {"calories": 0, "protein": 0, "fat": 0, "carbohydrates": 0},
  "cooking_time_min": 30,
  "deep_info": {
    "substitutions": ["대체 재료"],
    "tips": ["요리 팁"],
    "difficulty": "쉬움|보통|어려움",
    "chef_kick": "맛을 살리는 한 끗",
    "storage": "보관 방법"
  }
}"#;

/// Assemble the full prompt. Constraint sections are numbered in the order
/// they appear and omitted when empty; the allergy section is always present
/// when `allergies` is non-empty.
pub fn build_recipe_prompt(req: &RecipeRequest) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !req.ingredients.is_empty() {
        sections.push(format!("보유 재료: {}", req.ingredients.join(", ")));
    }
    sections.push(format!(
        "인분: {}인분 기준으로 모든 재료의 분량을 작성하세요.",
        req.servings
    ));
    let theme = req.theme.trim();
    if !theme.is_empty() {
        sections.push(format!("원하는 테마: {theme}"));
    }
    if !req.allergies.is_empty() {
        sections.push(format!(
            "알레르기 (절대 사용 금지): {}. 이 재료와 이 재료를 포함한 가공품, 소스, 육수를 어떤 단계에서도 사용하지 마세요.",
            req.allergies.join(", ")
        ));
    }
    if !req.dietary_preferences.is_empty() {
        sections.push(format!(
            "식단 제한 (제외할 것): {}",
            req.dietary_preferences.join(", ")
        ));
    }

    let numbered = |items: &[&str]| -> String {
        items
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let sections: Vec<&str> = sections.iter().map(String::as_str).collect();

    let mut out = format!("{ROLE}\n\n[입력 조건]\n");
    out.push_str(&numbered(&sections));
    out.push_str("\n\n[생각 순서]\n");
    out.push_str(&numbered(REASONING));
    out.push_str("\n\n[출력 형식]\n");
    out.push_str(&format!(
        "설명이나 마크다운 없이 정확히 {}개의 원소를 가진 JSON 배열만 출력하세요. 각 원소는 아래 형식을 따릅니다.\n",
        req.count
    ));
    out.push_str("theme_tags는 3개 이상 작성하세요.\n");
    out.push_str(&format!("[\n{SCHEMA}\n]"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RecipeRequest {
        RecipeRequest {
            ingredients: vec!["감자".into(), "당근".into(), "양파".into()],
            servings: 2,
            count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn includes_every_allergy_term_verbatim() {
        let mut req = request();
        req.allergies = vec!["땅콩".into(), "새우".into(), "shellfish".into()];
        let prompt = build_recipe_prompt(&req);
        for a in &req.allergies {
            assert!(prompt.contains(a.as_str()), "missing allergy {a}");
        }
        assert!(prompt.contains("절대 사용 금지"));
    }

    #[test]
    fn omits_empty_sections_and_numbers_without_gaps() {
        let prompt = build_recipe_prompt(&request());
        assert!(!prompt.contains("알레르기"));
        assert!(!prompt.contains("식단 제한"));
        assert!(!prompt.contains("원하는 테마"));
        assert!(prompt.contains("1. 보유 재료: 감자, 당근, 양파"));
        assert!(prompt.contains("2. 인분: 2인분"));
        assert!(!prompt.contains("\n3. 원하는"));
    }

    #[test]
    fn dynamic_numbering_follows_present_sections() {
        let mut req = request();
        req.dietary_preferences = vec!["비건".into()];
        let prompt = build_recipe_prompt(&req);
        assert!(prompt.contains("3. 식단 제한 (제외할 것): 비건"));

        req.theme = "다이어트".into();
        req.allergies = vec!["우유".into()];
        let prompt = build_recipe_prompt(&req);
        assert!(prompt.contains("3. 원하는 테마: 다이어트"));
        assert!(prompt.contains("4. 알레르기"));
        assert!(prompt.contains("5. 식단 제한"));
    }

    #[test]
    fn asks_for_exact_count_and_embeds_schema() {
        let mut req = request();
        req.count = 2;
        let prompt = build_recipe_prompt(&req);
        assert!(prompt.contains("정확히 2개의 원소"));
        assert!(prompt.contains("\"main_ingredients\""));
        assert!(prompt.contains("\"cooking_time_min\""));
        assert!(prompt.ends_with(']'));
    }

    #[test]
    fn whitespace_theme_is_treated_as_empty() {
        let mut req = request();
        req.theme = "   ".into();
        assert!(!build_recipe_prompt(&req).contains("원하는 테마"));
    }
}
