use todays_fridge::{app, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let app_state = AppState::init().await?;
    db::migrate(&app_state.db).await;

    app::serve(app::build_app(app_state)).await
}
