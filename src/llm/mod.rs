//! Generative text model clients.
//!
//! Every AI feature (recipe generation, safety check, ingredient
//! classification) goes through [`LlmProvider`], so the pipeline can be driven
//! by the real Gemini client or by [`FakeProvider`] in tests.

mod fake;
mod gemini;

pub use fake::FakeProvider;
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{GeminiConfig, LlmProviderKind};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    RequestFailed(String),

    #[error("model API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("failed to read model response: {0}")]
    ParseError(String),

    #[error("model provider not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send a single text prompt and return the model's raw text answer.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Build the provider selected by configuration.
pub fn create_provider(cfg: &GeminiConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match cfg.provider {
        LlmProviderKind::Fake => Ok(Arc::new(FakeProvider::with_recipe_responses())),
        LlmProviderKind::Gemini => {
            let api_key = cfg
                .api_key
                .clone()
                .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".into()))?;
            let provider = GeminiProvider::new(
                cfg.base_url.clone(),
                api_key,
                cfg.model.clone(),
                std::time::Duration::from_secs(cfg.timeout_secs),
            )?;
            Ok(Arc::new(provider))
        }
    }
}
