//! Size entry endpoints, nested under a color variant. Reads are public;
//! writes are admin-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;

use laceup_core::{ColorId, ShoeId, SizeStockId};

use crate::error::{ApiError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ColorVariant, Shoe};
use crate::services::catalog::{CatalogService, NewSizeStock, UpdateSizeStock};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shoes/{shoeId}/colors/{colorId}/sizes", get(list).post(create))
        .route(
            "/shoes/{shoeId}/colors/{colorId}/sizes/{sizeId}",
            get(get_one).put(update).delete(delete_one),
        )
}

fn variant(shoe: &Shoe, color_id: ColorId) -> Result<&ColorVariant> {
    shoe.color(color_id)
        .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Path((shoe_id, color_id)): Path<(ShoeId, ColorId)>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store()).get(shoe_id).await?;
    let color = variant(&shoe, color_id)?;
    Ok(Json(json!({ "success": true, "message": "OK", "sizes": color.sizes })))
}

#[instrument(skip(state))]
async fn get_one(
    State(state): State<AppState>,
    Path((shoe_id, color_id, size_id)): Path<(ShoeId, ColorId, SizeStockId)>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store()).get(shoe_id).await?;
    let entry = variant(&shoe, color_id)?
        .size_entry_by_id(size_id)
        .ok_or_else(|| ApiError::NotFound("Size entry".to_owned()))?;
    Ok(Json(json!({ "success": true, "message": "OK", "size": entry })))
}

#[instrument(skip(state, body))]
async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path((shoe_id, color_id)): Path<(ShoeId, ColorId)>,
    Json(body): Json<NewSizeStock>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let shoe = CatalogService::new(state.store())
        .add_size(shoe_id, color_id, &body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Size added", "shoe": shoe })),
    ))
}

#[instrument(skip(state, body))]
async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path((shoe_id, color_id, size_id)): Path<(ShoeId, ColorId, SizeStockId)>,
    Json(body): Json<UpdateSizeStock>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store())
        .update_size(shoe_id, color_id, size_id, &body)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Size updated", "shoe": shoe })))
}

#[instrument(skip(state))]
async fn delete_one(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path((shoe_id, color_id, size_id)): Path<(ShoeId, ColorId, SizeStockId)>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store())
        .delete_size(shoe_id, color_id, size_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Size deleted", "shoe": shoe })))
}
