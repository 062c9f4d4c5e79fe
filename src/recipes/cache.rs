//! Reuse of previously generated recipes.
//!
//! A request's cache key is its sorted ingredient list. A stored recipe is a
//! hit when its `main_ingredients` contains every ingredient of the key. The
//! store narrows candidates with an array containment query over all of the
//! owner's rows; `select_cached` re-checks each one.

use std::collections::HashSet;

use super::model::Recipe;

/// Trimmed, deduplicated and sorted ingredient names.
pub fn cache_key(ingredients: &[String]) -> Vec<String> {
    let mut key: Vec<String> = ingredients
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    key.sort();
    key.dedup();
    key
}

/// True when `candidate` contains every name in `key`.
pub fn is_superset(candidate: &[String], key: &[String]) -> bool {
    let have: HashSet<&str> = candidate.iter().map(|s| s.trim()).collect();
    key.iter().all(|k| have.contains(k.as_str()))
}

/// Keep superset matches from newest-first `candidates`, at most `limit`.
pub fn select_cached(candidates: Vec<Recipe>, key: &[String], limit: usize) -> Vec<Recipe> {
    candidates
        .into_iter()
        .filter(|r| is_superset(&r.main_ingredients, key))
        .take(limit)
        .collect()
}
