//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the map management REST endpoints and the per-map
//! widget websocket under a single Axum router. When `STATIC_DIR` is set,
//! the widget's browser bundle is served from it as the fallback.

pub mod maps;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/maps", get(maps::list_maps).post(maps::create_map))
        .route("/api/maps/{id}", get(maps::get_map).delete(maps::delete_map))
        .route("/api/maps/{id}/ws", get(ws::handle_ws))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
