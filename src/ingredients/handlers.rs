use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::dto::{CreateIngredientRequest, UpdateIngredientRequest};
use super::repo::{self, Ingredient};
use super::services::classify_ingredient;
use crate::{auth::AuthUser, state::AppState};

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/:id",
            patch(update_ingredient).delete(delete_ingredient),
        )
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Ingredient>>, (StatusCode, String)> {
    repo::list_by_user(&state.db, user_id)
        .await
        .map(Json)
        .map_err(internal)
}

#[instrument(skip(state, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>), (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }

    let category = classify_ingredient(state.llm.as_deref(), name).await;
    let ingredient = repo::create(
        &state.db,
        user_id,
        name,
        payload.quantity.trim(),
        category,
    )
    .await
    .map_err(internal)?;

    info!(%user_id, id = %ingredient.id, category = category.as_str(), "ingredient added");
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[instrument(skip(state, payload))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> Result<Json<Ingredient>, (StatusCode, String)> {
    repo::update_quantity(&state.db, user_id, id, payload.quantity.trim())
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Ingredient not found".into()))
}

#[instrument(skip(state))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::delete(&state.db, user_id, id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Ingredient not found".into()))
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "ingredient request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
