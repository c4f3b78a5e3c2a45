//! Router construction and the serve loop.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;
use crate::server::{http, ws};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::health))
        .route("/games", post(http::create_game))
        .route("/ws/:game_id", get(ws::ws_handler))
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    tracing::info!(%addr, "railbird server running");
    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}
