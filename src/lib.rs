//! Drawphone game server
//!
//! Players join named rooms over a WebSocket and play the drawing-and-guessing
//! telephone game; every change is pushed to the room as a full snapshot.

pub mod broadcast;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event_logger;
pub mod game;
pub mod presence;
pub mod protocol;
pub mod rate_limiter;
pub mod room;
pub mod state;
pub mod ws;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{DrawphoneError, Result};
pub use state::AppState;

async fn index_handler() -> &'static str {
    "Drawphone server. Connect a client to /ws."
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// HTTP routes: greeting, health check and the game socket
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
