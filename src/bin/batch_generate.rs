//! Seed the shared catalog from an ingredient list.
//!
//! Usage: `batch-generate <ingredients.txt>` with one ingredient per line.
//! Blank lines and lines starting with `#` are ignored.

use std::time::Duration;

use anyhow::Context;
use todays_fridge::{
    app,
    config::{parse_env, GeminiConfig},
    db, llm,
    recipes::{
        batch::{run_batch, BatchOptions},
        store::PgRecipeStore,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let path = std::env::args()
        .nth(1)
        .context("usage: batch-generate <ingredients.txt>")?;
    let contents =
        std::fs::read_to_string(&path).with_context(|| format!("read ingredient list {path}"))?;
    let ingredients: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect();

    let gemini = GeminiConfig::from_env()?;
    let provider = llm::create_provider(&gemini)?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let pool = db::connect(&database_url).await?;
    db::migrate(&pool).await;

    let defaults = BatchOptions::default();
    let opts = BatchOptions {
        servings: parse_env("BATCH_SERVINGS", defaults.servings)?,
        recipes_per_item: parse_env("BATCH_RECIPES_PER_ITEM", defaults.recipes_per_item)?,
        timeout: Duration::from_secs(parse_env(
            "BATCH_TIMEOUT_SECS",
            defaults.timeout.as_secs(),
        )?),
    };

    tracing::info!(
        items = ingredients.len(),
        model = provider.model_name(),
        "starting batch"
    );
    let store = PgRecipeStore::new(pool);
    let summary = run_batch(&store, provider.as_ref(), &ingredients, &opts).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
