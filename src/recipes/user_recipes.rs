//! Personal copies of catalog recipes. Edits pass through the safety gate
//! before they are stored.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::dto::UpdateUserRecipeRequest;
use super::handlers::{find, internal};
use super::model::UserRecipe;
use super::repo;
use crate::{
    auth::AuthUser,
    safety::{check_recipe_text, SafetyVerdict},
    state::AppState,
};

pub fn user_recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/:id/save", post(save_recipe))
        .route("/my-recipes", get(list_my_recipes))
        .route(
            "/my-recipes/:id",
            put(update_my_recipe).delete(delete_my_recipe),
        )
}

#[instrument(skip(state))]
pub async fn save_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<UserRecipe>), (StatusCode, String)> {
    let recipe = find(&state, id).await?;
    let saved = repo::save_copy(&state.db, user_id, &recipe)
        .await
        .map_err(internal)?;
    info!(%user_id, original = %id, copy = %saved.id, "recipe saved");
    Ok((StatusCode::CREATED, Json(saved)))
}

#[instrument(skip(state))]
pub async fn list_my_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserRecipe>>, (StatusCode, String)> {
    repo::list_user_recipes(&state.db, user_id)
        .await
        .map(Json)
        .map_err(internal)
}

#[instrument(skip(state, payload))]
pub async fn update_my_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRecipeRequest>,
) -> Result<Json<UserRecipe>, (StatusCode, String)> {
    if !payload.safety_consent {
        return Err((
            StatusCode::BAD_REQUEST,
            "safety_consent is required to edit a recipe".into(),
        ));
    }
    let edit = payload
        .edit
        .normalized()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let Some(llm) = state.llm.as_deref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "safety check is not configured".into(),
        ));
    };
    let verdict = check_recipe_text(llm, &edit.render_text())
        .await
        .map_err(|e| {
            error!(error = %e, %id, "safety check failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;
    if verdict == SafetyVerdict::Unsafe {
        warn!(%user_id, %id, "edit rejected by safety check");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "recipe failed the safety check".into(),
        ));
    }

    let updated = repo::update_user_recipe(&state.db, user_id, id, &edit, true)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Recipe not found".into()))?;
    info!(%user_id, %id, "recipe edited");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_my_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::delete_user_recipe(&state.db, user_id, id)
        .await
        .map_err(internal)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Recipe not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;
    use std::sync::Arc;

    fn payload(consent: bool, title: &str) -> UpdateUserRecipeRequest {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "main_ingredients": ["감자"],
            "instructions": ["1. 감자를 삶는다"],
            "cooking_time_minutes": 15,
            "servings": 2,
            "safety_consent": consent
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn edit_requires_consent() {
        let err = update_my_recipe(
            State(AppState::fake()),
            AuthUser(Uuid::new_v4()),
            Path(Uuid::new_v4()),
            Json(payload(false, "감자")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_edit_is_rejected_before_model_call() {
        let err = update_my_recipe(
            State(AppState::fake()),
            AuthUser(Uuid::new_v4()),
            Path(Uuid::new_v4()),
            Json(payload(true, "   ")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsafe_edit_is_unprocessable() {
        let mut state = AppState::fake();
        state.llm = Some(Arc::new(FakeProvider::with_response("SAFE 또는 UNSAFE", "UNSAFE")));
        let err = update_my_recipe(
            State(state),
            AuthUser(Uuid::new_v4()),
            Path(Uuid::new_v4()),
            Json(payload(true, "표백제 무침")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn edit_without_model_is_unavailable() {
        let mut state = AppState::fake();
        state.llm = None;
        let err = update_my_recipe(
            State(state),
            AuthUser(Uuid::new_v4()),
            Path(Uuid::new_v4()),
            Json(payload(true, "감자")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
