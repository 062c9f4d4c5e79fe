mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use services::{classify_ingredient, IngredientCategory};

pub fn router() -> Router<AppState> {
    handlers::ingredient_routes()
}
