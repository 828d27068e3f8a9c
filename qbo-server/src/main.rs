//! QBO Bridge Server - Headless Daemon
//!
//! A pure Rust HTTP server that:
//! - Maintains the QuickBooks OAuth connection (refresh, persistence)
//! - Keeps an hourly-refreshed cache of customers, vendors, items, invoices
//! - Serves a REST API for status, search, and cached data on /api/*
//!
//! Access via: http://localhost:5002

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod scheduler;
mod state;

#[cfg(test)]
mod test_helpers;

use qbo_core::cache::CacheStore;
use qbo_core::{Config, FileTokenStore, QboClient, TokenManager};
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "qbo-server", about = "Headless QuickBooks bridge daemon")]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "QBO_PORT", default_value_t = 5002)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "QBO_BIND", default_value = "0.0.0.0")]
    bind: std::net::IpAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("QBO Bridge server starting on port {}...", cli.port);

    let config = Arc::new(Config::from_env());
    config.log_summary();
    if !config.has_credentials() {
        tracing::warn!("QuickBooks credentials not configured; OAuth connect is unavailable");
    }

    let store = Arc::new(FileTokenStore::new(config.token_file.clone()));
    let tokens = Arc::new(TokenManager::new(config.clone(), store).context("token manager")?);
    tokens.load();

    let client = Arc::new(QboClient::new(config.clone(), tokens.clone()).context("client")?);
    let cache = Arc::new(CacheStore::new());

    let state = AppState::new(config, tokens, client.clone(), cache.clone());
    info!("Application state initialized");

    tokio::spawn(scheduler::run(client, cache));

    let app = build_router(state);

    let addr = SocketAddr::from((cli.bind, cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("API available at http://localhost:{}/api/", cli.port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::router())
        // The OAuth redirect URI registered with Intuit points here.
        .route("/callback", get(api::oauth::handle_callback))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
