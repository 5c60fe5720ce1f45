//! HTTP surface.
//!
//! All endpoints live under `/api/v1` and answer with a JSON envelope of
//! `{ "success": bool, "message": string, ... }`. Handlers stay thin:
//! extract, call a service, wrap the result.

pub mod auth;
pub mod carts;
pub mod colors;
pub mod orders;
pub mod shoes;
pub mod sizes;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(shoes::routes())
        .merge(colors::routes())
        .merge(sizes::routes())
        .merge(carts::routes())
        .merge(orders::routes());

    Router::new()
        .route("/health-check", get(health_check))
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "OK" }))
}
