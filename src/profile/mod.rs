pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub use repo::Profile;

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}

/// Trimmed, non-empty terms in first-seen order without duplicates.
pub fn clean_terms<'a>(terms: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in terms {
        let t = t.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
