//! Deterministic provider for local runs and tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{LlmError, LlmProvider};

/// Answers prompts by substring match, first registered pattern wins.
/// Counts every call so tests can assert the model was (or was not) used.
#[derive(Debug, Default)]
pub struct FakeProvider {
    responses: Mutex<Vec<(String, Result<String, String>)>>,
    default_response: Option<String>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    pub fn add_response(&self, prompt_contains: &str, response: &str) {
        self.lock()
            .push((prompt_contains.to_string(), Ok(response.to_string())));
    }

    /// Register a pattern whose prompts fail with `LlmError::RequestFailed`.
    pub fn add_failure(&self, prompt_contains: &str, message: &str) {
        self.lock()
            .push((prompt_contains.to_string(), Err(message.to_string())));
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Canned answers for every prompt the service sends.
    pub fn with_recipe_responses() -> Self {
        let provider = Self::new();
        provider.add_response("SAFE 또는 UNSAFE", "SAFE");
        provider.add_response("카테고리 중 하나", "vegetable");
        provider.add_response(
            "main_ingredients",
            r#"[
  {
    "title": "감자조림",
    "main_ingredients": ["감자", "양파"],
    "theme_tags": ["밑반찬", "간단요리", "한식"],
    "ingredients": [
      {"name": "감자", "amount": "2개", "category": "vegetable", "main_or_sub": "main"},
      {"name": "간장", "amount": "3큰술", "category": "seasoning", "main_or_sub": "sub"}
    ],
    "steps": [
      {"step_no": 1, "action": "감자를 한입 크기로 썬다"},
      {"step_no": 2, "action": "간장 양념에 졸인다", "tip": "약불로 졸이면 타지 않는다"}
    ],
    "nutrition": {"calories": 220, "protein": 4, "fat": 3, "carbohydrates": 45},
    "cooking_time_min": 25
  }
]"#,
        );
        provider
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Result<String, String>)>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let prompt_lower = prompt.to_lowercase();
        let matched = self
            .lock()
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(&pattern.to_lowercase()))
            .map(|(_, response)| response.clone());

        match (matched, &self.default_response) {
            (Some(Ok(text)), _) => Ok(text),
            (Some(Err(message)), _) => Err(LlmError::RequestFailed(message)),
            (None, Some(text)) => Ok(text.clone()),
            (None, None) => Err(LlmError::RequestFailed(format!(
                "no fake response for prompt: {}",
                prompt.chars().take(80).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_case_insensitively_and_counts_calls() {
        let provider = FakeProvider::with_response("HELLO", "world");
        assert_eq!(provider.complete("say hello").await.unwrap(), "world");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn unmatched_prompt_without_default_fails() {
        let provider = FakeProvider::new();
        assert!(provider.complete("anything").await.is_err());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn registered_failure_surfaces_message() {
        let provider = FakeProvider::new();
        provider.add_failure("boom", "quota exceeded");
        let err = provider.complete("boom").await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn default_response_used_when_nothing_matches() {
        let provider = FakeProvider::new().with_default_response("fallback");
        assert_eq!(provider.complete("xyz").await.unwrap(), "fallback");
    }
}
