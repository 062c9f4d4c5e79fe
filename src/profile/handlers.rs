use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;
use tracing::{error, info, instrument};

use super::{clean_terms, repo, Profile};
use crate::{auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, (StatusCode, String)> {
    repo::get_or_default(&state.db, user_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, %user_id, "get_profile failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let profile = Profile {
        user_id,
        allergies: clean_terms(&payload.allergies),
        dietary_preferences: clean_terms(&payload.dietary_preferences),
    };
    let saved = repo::upsert(&state.db, &profile).await.map_err(|e| {
        error!(error = %e, %user_id, "update_profile failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    info!(%user_id, allergies = saved.allergies.len(), "profile updated");
    Ok(Json(saved))
}
