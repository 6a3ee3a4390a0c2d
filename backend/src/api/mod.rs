// HTTP surface: the game WebSocket plus health and metrics endpoints.

pub mod ws;

use axum::{
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::engine::directory::RoomDirectory;
use crate::metrics;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub directory: RoomDirectory,
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(directory: RoomDirectory) -> Router {
    let state = AppState { directory };

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/ws", get(ws::ws_game))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "land-backend" }))
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}
