use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::LlmProvider;

/// Closed set of fridge categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Meat,
    Vegetable,
    Seafood,
    Grain,
    Dairy,
    Seasoning,
    Fruit,
    Other,
}

impl IngredientCategory {
    pub const ALL: [IngredientCategory; 8] = [
        IngredientCategory::Meat,
        IngredientCategory::Vegetable,
        IngredientCategory::Seafood,
        IngredientCategory::Grain,
        IngredientCategory::Dairy,
        IngredientCategory::Seasoning,
        IngredientCategory::Fruit,
        IngredientCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Meat => "meat",
            IngredientCategory::Vegetable => "vegetable",
            IngredientCategory::Seafood => "seafood",
            IngredientCategory::Grain => "grain",
            IngredientCategory::Dairy => "dairy",
            IngredientCategory::Seasoning => "seasoning",
            IngredientCategory::Fruit => "fruit",
            IngredientCategory::Other => "other",
        }
    }

    /// Accepts the English keys and their Korean labels; unknown → `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        let s = s
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
            .to_lowercase();
        let by_key = Self::ALL.iter().copied().find(|c| c.as_str() == s);
        by_key.unwrap_or(match s.as_str() {
            "육류" | "고기" => IngredientCategory::Meat,
            "채소" | "야채" => IngredientCategory::Vegetable,
            "해산물" | "수산물" => IngredientCategory::Seafood,
            "곡물" | "곡류" => IngredientCategory::Grain,
            "유제품" => IngredientCategory::Dairy,
            "양념" | "조미료" => IngredientCategory::Seasoning,
            "과일" => IngredientCategory::Fruit,
            _ => IngredientCategory::Other,
        })
    }
}

fn classification_prompt(name: &str) -> String {
    let keys: Vec<&str> = IngredientCategory::ALL.iter().map(|c| c.as_str()).collect();
    format!(
        "식재료 \"{name}\"를 다음 카테고리 중 하나로 분류하세요: {}.\n\
         다른 설명 없이 카테고리 키 하나만 소문자로 답하세요.",
        keys.join(", ")
    )
}

/// One model call; any failure or unrecognized answer yields `Other`.
pub async fn classify_ingredient(llm: Option<&dyn LlmProvider>, name: &str) -> IngredientCategory {
    let Some(llm) = llm else {
        return IngredientCategory::Other;
    };
    match llm.complete(&classification_prompt(name)).await {
        Ok(answer) => {
            let category = IngredientCategory::parse_lenient(&answer);
            debug!(%name, category = category.as_str(), "ingredient classified");
            category
        }
        Err(e) => {
            warn!(error = %e, %name, "ingredient classification failed");
            IngredientCategory::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;

    #[test]
    fn parses_keys_labels_and_noise() {
        assert_eq!(IngredientCategory::parse_lenient("meat"), IngredientCategory::Meat);
        assert_eq!(IngredientCategory::parse_lenient(" Seafood.\n"), IngredientCategory::Seafood);
        assert_eq!(IngredientCategory::parse_lenient("\"dairy\""), IngredientCategory::Dairy);
        assert_eq!(IngredientCategory::parse_lenient("채소"), IngredientCategory::Vegetable);
        assert_eq!(IngredientCategory::parse_lenient("I think it is meat"), IngredientCategory::Other);
        assert_eq!(IngredientCategory::parse_lenient(""), IngredientCategory::Other);
    }

    #[test]
    fn prompt_lists_every_category() {
        let prompt = classification_prompt("연어");
        for c in IngredientCategory::ALL {
            assert!(prompt.contains(c.as_str()));
        }
        assert!(prompt.contains("연어"));
    }

    #[tokio::test]
    async fn classifies_with_model_answer() {
        let llm = FakeProvider::with_response("연어", "seafood");
        assert_eq!(
            classify_ingredient(Some(&llm), "연어").await,
            IngredientCategory::Seafood
        );
    }

    #[tokio::test]
    async fn falls_back_to_other() {
        let failing = FakeProvider::new();
        assert_eq!(
            classify_ingredient(Some(&failing), "연어").await,
            IngredientCategory::Other
        );
        assert_eq!(classify_ingredient(None, "연어").await, IngredientCategory::Other);
    }
}
