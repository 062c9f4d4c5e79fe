use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    CatalogQuery, GenerateRecipesRequest, GenerateRecipesResponse, RecipeDetails, RelatedRecipes,
    MAX_SERVINGS,
};
use super::model::{group_ingredients, Recipe};
use super::prompt::RecipeRequest;
use super::repo;
use super::services::{generate_recipes, GenerationContext, GenerationError};
use crate::{
    auth::MaybeAuthUser,
    profile::{self, clean_terms},
    state::AppState,
};

const RELATED_LIMIT: i64 = 4;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/generate", post(generate))
        .route("/recipes/:id", get(get_recipe))
        .route("/recipes/:id/related", get(related_recipes))
}

#[instrument(skip(state, payload))]
pub async fn generate(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(payload): Json<GenerateRecipesRequest>,
) -> Result<Json<GenerateRecipesResponse>, (StatusCode, String)> {
    if payload.servings == 0 || payload.servings > MAX_SERVINGS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("servings must be between 1 and {MAX_SERVINGS}"),
        ));
    }
    let Some(llm) = state.llm.clone() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "recipe generation is not configured".into(),
        ));
    };

    // Stored profile restrictions always apply on top of the request's own.
    let (mut allergies, mut preferences) = (payload.allergies, payload.dietary_preferences);
    if let Some(user_id) = user {
        match profile::repo::get_or_default(&state.db, user_id).await {
            Ok(p) => {
                allergies = clean_terms(p.allergies.iter().chain(allergies.iter()));
                preferences =
                    clean_terms(p.dietary_preferences.iter().chain(preferences.iter()));
            }
            Err(e) => warn!(error = %e, %user_id, "profile lookup failed; using request terms"),
        }
    }

    let request = RecipeRequest {
        ingredients: payload.ingredients,
        servings: payload.servings,
        theme: payload.theme.unwrap_or_default(),
        allergies: clean_terms(&allergies),
        dietary_preferences: clean_terms(&preferences),
        count: state.config.generation.batch_size,
    };
    let ctx = GenerationContext {
        store: state.recipes.as_ref(),
        llm: llm.as_ref(),
        config: &state.config.generation,
        timeout: state.llm_timeout(),
    };

    let outcome = generate_recipes(&ctx, user, request)
        .await
        .map_err(|e| {
            let status = generation_status(&e);
            if status.is_server_error() {
                error!(error = %e, "recipe generation failed");
            }
            (status, e.to_string())
        })?;

    Ok(Json(GenerateRecipesResponse {
        recipes: outcome.recipes,
        cached: outcome.cached,
        generated: outcome.generated,
    }))
}

pub(crate) fn generation_status(e: &GenerationError) -> StatusCode {
    match e {
        GenerationError::NoIngredients => StatusCode::BAD_REQUEST,
        GenerationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        GenerationError::Model(_)
        | GenerationError::Normalize(_)
        | GenerationError::NoValidRecipes { .. } => StatusCode::BAD_GATEWAY,
        GenerationError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> Result<Json<Vec<Recipe>>, (StatusCode, String)> {
    let (limit, offset) = q.clamped();
    let search = q.q.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let tag = q.tag.as_deref().map(str::trim).filter(|s| !s.is_empty());
    repo::list_catalog(&state.db, search, tag, limit, offset)
        .await
        .map(Json)
        .map_err(internal)
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeDetails>, (StatusCode, String)> {
    let recipe = find(&state, id).await?;
    let ingredient_groups = group_ingredients(&recipe.ingredients_detail);
    Ok(Json(RecipeDetails {
        recipe,
        ingredient_groups,
    }))
}

#[instrument(skip(state))]
pub async fn related_recipes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RelatedRecipes>, (StatusCode, String)> {
    let recipe = find(&state, id).await?;
    let db = &state.db;

    let by_ingredient = async {
        match recipe.main_ingredients.first() {
            Some(i) => repo::related_by_ingredient(db, id, i, RELATED_LIMIT).await,
            None => Ok(Vec::new()),
        }
    };
    let by_tag = async {
        match recipe.theme_tags.first() {
            Some(t) => repo::related_by_tag(db, id, t, RELATED_LIMIT).await,
            None => Ok(Vec::new()),
        }
    };
    let by_cooking_time =
        repo::related_by_cooking_time(db, id, recipe.cooking_time_minutes, RELATED_LIMIT);

    let (by_ingredient, by_tag, by_cooking_time) =
        tokio::try_join!(by_ingredient, by_tag, by_cooking_time).map_err(internal)?;
    info!(
        %id,
        ingredient = by_ingredient.len(),
        tag = by_tag.len(),
        time = by_cooking_time.len(),
        "related recipes"
    );
    Ok(Json(RelatedRecipes {
        by_ingredient,
        by_tag,
        by_cooking_time,
    }))
}

pub(crate) async fn find(state: &AppState, id: Uuid) -> Result<Recipe, (StatusCode, String)> {
    repo::get_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Recipe not found".into()))
}

pub(crate) fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "recipe request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
