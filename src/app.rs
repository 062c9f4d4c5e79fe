use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use axum::{
    http::{Request, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Span;

use crate::config::parse_env;
use crate::state::AppState;
use crate::{ingredients, profile, recipes};

/// Log setup shared by the server and the batch binary.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "todays_fridge=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(recipes::router())
        .merge(ingredients::router())
        .merge(profile::router())
        .route("/health", get(|| async { "ok" }));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        status = tracing::field::Empty,
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                    let status = res.status();
                    span.record("status", status.as_u16());
                    let ms = latency.as_millis() as u64;
                    if status.is_server_error() {
                        tracing::error!(%status, ms, "request failed");
                    } else {
                        tracing::info!(%status, ms, "request finished");
                    }
                }),
        )
}

/// `APP_HOST` / `APP_PORT`, defaulting to `0.0.0.0:8080`.
pub fn bind_addr() -> anyhow::Result<SocketAddr> {
    let host: IpAddr = parse_env("APP_HOST", IpAddr::from([0, 0, 0, 0]))?;
    let port: u16 = parse_env("APP_PORT", 8080)?;
    Ok(SocketAddr::new(host, port))
}

/// Serve until ctrl-c; in-flight requests are allowed to finish.
pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr = bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown requested");
        })
        .await?;
    Ok(())
}
