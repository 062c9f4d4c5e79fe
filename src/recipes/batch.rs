//! Offline catalog seeding.
//!
//! Each ingredient is an independent unit of work: a failure is recorded in
//! `recipe_generation_logs` and the run moves on to the next item. Inside an
//! item every dish is checked against existing titles and inserted on its own.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::prompt::RecipeRequest;
use super::services::request_recipes;
use super::store::{BatchLogEntry, BatchStatus, RecipeStore};
use crate::llm::LlmProvider;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub servings: u32,
    pub recipes_per_item: usize,
    pub timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            servings: 2,
            recipes_per_item: 3,
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub items: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub async fn run_batch(
    store: &dyn RecipeStore,
    llm: &dyn LlmProvider,
    ingredients: &[String],
    opts: &BatchOptions,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for ingredient in ingredients.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        summary.items += 1;
        process_item(store, llm, ingredient, opts, &mut summary).await;
    }
    info!(
        items = summary.items,
        success = summary.success,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch finished"
    );
    summary
}

#[instrument(skip(store, llm, opts, summary))]
async fn process_item(
    store: &dyn RecipeStore,
    llm: &dyn LlmProvider,
    ingredient: &str,
    opts: &BatchOptions,
    summary: &mut BatchSummary,
) {
    let request = RecipeRequest {
        ingredients: vec![ingredient.to_string()],
        servings: opts.servings,
        count: opts.recipes_per_item,
        ..Default::default()
    };

    let batch = match request_recipes(llm, opts.timeout, &request).await {
        Ok(batch) => batch,
        Err(e) => {
            error!(error = %e, "generation failed");
            summary.failed += 1;
            log(store, entry(ingredient, None, BatchStatus::Failed, Some(e.to_string()))).await;
            return;
        }
    };

    for (index, reason) in &batch.skipped {
        summary.failed += 1;
        log(
            store,
            entry(
                ingredient,
                None,
                BatchStatus::Failed,
                Some(format!("element {index}: {reason}")),
            ),
        )
        .await;
    }

    for recipe in &batch.recipes {
        let dish = Some(recipe.title.clone());
        match store.title_exists(&recipe.title).await {
            Ok(true) => {
                info!(dish = %recipe.title, "duplicate title, skipping");
                summary.skipped += 1;
                log(
                    store,
                    entry(
                        ingredient,
                        dish,
                        BatchStatus::Skipped,
                        Some("duplicate title".into()),
                    ),
                )
                .await;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                error!(error = %e, dish = %recipe.title, "title check failed");
                summary.failed += 1;
                log(store, entry(ingredient, dish, BatchStatus::Failed, Some(format!("{e:#}")))).await;
                continue;
            }
        }

        match store.insert_one(None, recipe).await {
            Ok(()) => {
                info!(dish = %recipe.title, "recipe saved");
                summary.success += 1;
                log(store, entry(ingredient, dish, BatchStatus::Success, None)).await;
            }
            Err(e) => {
                error!(error = %e, dish = %recipe.title, "insert failed");
                summary.failed += 1;
                log(store, entry(ingredient, dish, BatchStatus::Failed, Some(format!("{e:#}")))).await;
            }
        }
    }
}

fn entry(
    ingredient: &str,
    dish_name: Option<String>,
    status: BatchStatus,
    reason: Option<String>,
) -> BatchLogEntry {
    BatchLogEntry {
        ingredient: ingredient.to_string(),
        dish_name,
        status,
        reason,
    }
}

async fn log(store: &dyn RecipeStore, entry: BatchLogEntry) {
    if let Err(e) = store.record_batch_log(&entry).await {
        warn!(error = %e, status = entry.status.as_str(), "could not write generation log");
    }
}
