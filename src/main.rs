//! Code Practice · Learning Platform Backend
//!
//! - Axum HTTP API (challenges, definitions, submissions, progress, auth)
//! - Pluggable content store: in-memory (default) or PostgREST-style REST backend
//! - Static SPA fallback (<static_dir>/index.html)
//!
//! Important env variables:
//!   PORT            : u16 (default 3000)
//!   STATIC_DIR      : frontend build directory (default "./static")
//!   APP_CONFIG_PATH : path to TOML config (store, evaluation, optional content bank)
//!   STORE_BACKEND   : "memory" (default) or "rest"
//!   STORE_URL       : REST backend base URL
//!   STORE_API_KEY   : REST backend API key
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod state;
mod protocol;
mod error;
mod store;
mod auth;
mod evaluation;
mod progress;
mod catalog;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::config::resolve_config;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // File config (if any) with env overrides applied on top.
  let cfg = resolve_config();

  // Build shared application state (store, identity provider, services).
  let state = Arc::new(AppState::from_config(&cfg));

  // Build the HTTP router with routes, CORS, tracing and the static frontend.
  let app = build_router(state, &cfg.server.static_dir);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "code_practice", %addr, static_dir = %cfg.server.static_dir, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "code_practice", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "code_practice", "Shutdown signal received");
}
