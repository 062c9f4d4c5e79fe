use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Verification settings for access tokens issued by the hosted auth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub audience: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    Gemini,
    Fake,
}

/// Generative model client settings. `api_key` is optional so the API can
/// start without credentials; generation is then reported as unavailable.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Number of recipes returned per generation request.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub gemini: GeminiConfig,
    pub generation: GenerationConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let jwt = JwtConfig {
            secret: std::env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?,
            audience: std::env::var("SUPABASE_JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".into()),
            issuer: std::env::var("SUPABASE_JWT_ISSUER").ok(),
        };
        Ok(Self {
            database_url,
            jwt,
            gemini: GeminiConfig::from_env()?,
            generation: GenerationConfig::from_env()?,
        })
    }
}

impl GeminiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match std::env::var("LLM_PROVIDER") {
            Err(_) => LlmProviderKind::Gemini,
            Ok(v) => match v.trim().to_lowercase().as_str() {
                "gemini" => LlmProviderKind::Gemini,
                "fake" => LlmProviderKind::Fake,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "LLM_PROVIDER",
                        value: v,
                    })
                }
            },
        };
        Ok(Self {
            provider,
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into()),
            timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
        })
    }
}

impl GenerationConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let batch_size: usize = parse_env("RECIPE_BATCH_SIZE", 3)?;
        if batch_size == 0 {
            return Err(ConfigError::Invalid {
                name: "RECIPE_BATCH_SIZE",
                value: "0".into(),
            });
        }
        Ok(Self { batch_size })
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { batch_size: 3 }
    }
}

pub fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}
