//! Catalog endpoints for shoes. Reads are public; writes are admin-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;

use laceup_core::ShoeId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::catalog::{CatalogService, NewShoe, ShoeQuery, UpdateShoe};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shoes", get(list).post(create))
        .route("/shoes/brands", get(brands))
        .route(
            "/shoes/{shoeId}",
            get(get_one).put(update).delete(delete_one),
        )
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ShoeQuery>,
) -> Result<Json<serde_json::Value>> {
    let page = CatalogService::new(state.store()).list(&query).await?;
    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "shoes": page.shoes,
        "total": page.total,
        "page": page.page,
        "length": page.length,
    })))
}

#[instrument(skip(state))]
async fn brands(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let brands = CatalogService::new(state.store()).brands().await?;
    Ok(Json(json!({ "success": true, "message": "OK", "brands": brands })))
}

#[instrument(skip(state))]
async fn get_one(
    State(state): State<AppState>,
    Path(shoe_id): Path<ShoeId>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store()).get(shoe_id).await?;
    Ok(Json(json!({ "success": true, "message": "OK", "shoe": shoe })))
}

#[instrument(skip(state, body))]
async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<NewShoe>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let shoe = CatalogService::new(state.store()).create_shoe(&body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Shoe created", "shoe": shoe })),
    ))
}

#[instrument(skip(state, body))]
async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(shoe_id): Path<ShoeId>,
    Json(body): Json<UpdateShoe>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store())
        .update_shoe(shoe_id, &body)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Shoe updated", "shoe": shoe })))
}

#[instrument(skip(state))]
async fn delete_one(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(shoe_id): Path<ShoeId>,
) -> Result<Json<serde_json::Value>> {
    CatalogService::new(state.store()).delete_shoe(shoe_id).await?;
    Ok(Json(json!({ "success": true, "message": "Shoe deleted" })))
}
