//! Block Quiz · Promotional Quiz Backend
//!
//! - Round engine for the "match the building block" drag-and-drop quiz
//! - Axum HTTP + WebSocket API for sessions and attempts
//! - Submission endpoint (local JSON file or hosted REST table)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   GAME_CONFIG_PATH   : path to TOML config (game settings, storage, optional catalog)
//!   DATA_DIR           : overrides storage.data_dir for the JSON file backend
//!   SUBMISSION_API_KEY : API key for the rest_table backend
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod catalog;
mod config;
mod logic;
mod engine;
mod submission;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Invalid game settings are a deployment bug: refuse to serve.
  let state = match AppState::from_env() {
    Ok(s) => Arc::new(s),
    Err(e) => {
      error!(target: "blockquiz_backend", error = %e, "Startup configuration rejected");
      return Err(e.into());
    }
  };

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "blockquiz_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "blockquiz_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "blockquiz_backend", error = %e, "Failed to listen for shutdown signal");
  }
}
