use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::cache::{cache_key, select_cached};
use super::model::Recipe;
use super::normalize::{normalize_response, NormalizeError, NormalizedBatch};
use super::prompt::{build_recipe_prompt, RecipeRequest};
use super::store::RecipeStore;
use crate::config::GenerationConfig;
use crate::llm::{LlmError, LlmProvider};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("at least one ingredient is required")]
    NoIngredients,

    #[error(transparent)]
    Model(#[from] LlmError),

    #[error("model did not answer within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("model response had no usable recipes ({skipped} skipped)")]
    NoValidRecipes { skipped: usize },

    #[error("failed to save generated recipes: {0:#}")]
    Persistence(anyhow::Error),
}

/// Collaborators for one generation request.
pub struct GenerationContext<'a> {
    pub store: &'a dyn RecipeStore,
    pub llm: &'a dyn LlmProvider,
    pub config: &'a GenerationConfig,
    pub timeout: Duration,
}

#[derive(Debug)]
pub struct GenerationOutcome {
    /// Cached recipes first, then fresh ones in model order.
    pub recipes: Vec<Recipe>,
    pub cached: usize,
    pub generated: usize,
    pub skipped: usize,
}

/// Cache lookup, then generation for whatever the cache could not cover.
/// Anonymous requests (`owner == None`) always generate.
#[instrument(skip_all, fields(owner = ?owner, ingredients = request.ingredients.len()))]
pub async fn generate_recipes(
    ctx: &GenerationContext<'_>,
    owner: Option<Uuid>,
    mut request: RecipeRequest,
) -> Result<GenerationOutcome, GenerationError> {
    let batch_size = ctx.config.batch_size;
    request.ingredients = cache_key(&request.ingredients);
    if request.ingredients.is_empty() {
        return Err(GenerationError::NoIngredients);
    }

    let mut recipes = match owner {
        Some(user_id) => lookup_cache(ctx, user_id, &request.ingredients).await,
        None => Vec::new(),
    };
    let cached = recipes.len();
    if cached >= batch_size {
        info!(cached, "cache covers the request, skipping generation");
        return Ok(GenerationOutcome {
            recipes,
            cached,
            generated: 0,
            skipped: 0,
        });
    }

    request.count = batch_size - cached;
    let batch = request_recipes(ctx.llm, ctx.timeout, &request).await?;
    let skipped = batch.skipped_count();
    if batch.recipes.is_empty() {
        warn!(skipped, "no valid recipes in model response");
        return Err(GenerationError::NoValidRecipes { skipped });
    }

    ctx.store
        .insert_batch(owner, &batch.recipes)
        .await
        .map_err(GenerationError::Persistence)?;

    let generated = batch.recipes.len();
    info!(
        cached,
        generated,
        skipped,
        model = ctx.llm.model_name(),
        "recipes generated"
    );
    recipes.extend(batch.recipes);
    recipes.truncate(batch_size);
    Ok(GenerationOutcome {
        recipes,
        cached,
        generated,
        skipped,
    })
}

/// Prompt, model call bounded by `timeout`, normalization.
pub async fn request_recipes(
    llm: &dyn LlmProvider,
    timeout: Duration,
    request: &RecipeRequest,
) -> Result<NormalizedBatch, GenerationError> {
    let prompt = build_recipe_prompt(request);
    let raw = tokio::time::timeout(timeout, llm.complete(&prompt))
        .await
        .map_err(|_| GenerationError::Timeout(timeout))??;
    Ok(normalize_response(&raw, request.servings)?)
}

/// A failed lookup degrades to an empty cache.
async fn lookup_cache(ctx: &GenerationContext<'_>, user_id: Uuid, key: &[String]) -> Vec<Recipe> {
    match ctx
        .store
        .matching_by_owner(user_id, key, ctx.config.batch_size as i64)
        .await
    {
        Ok(candidates) => select_cached(candidates, key, ctx.config.batch_size),
        Err(e) => {
            warn!(error = %e, %user_id, "recipe cache lookup failed");
            Vec::new()
        }
    }
}
