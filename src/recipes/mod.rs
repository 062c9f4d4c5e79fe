pub mod batch;
pub mod cache;
mod dto;
pub mod handlers;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod repo;
pub mod services;
pub mod store;
pub mod user_recipes;

use crate::state::AppState;
use axum::Router;

pub use model::Recipe;

pub fn router() -> Router<AppState> {
    handlers::recipe_routes().merge(user_recipes::user_recipe_routes())
}
