//! Color variant endpoints, nested under a shoe. Reads are public; writes
//! are admin-only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;

use laceup_core::{ColorId, ShoeId};

use crate::error::{ApiError, Result};
use crate::middleware::RequireAdmin;
use crate::models::ColorVariant;
use crate::services::catalog::{CatalogService, NewColor, UpdateColor};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shoes/{shoeId}/colors", get(list).post(create))
        .route(
            "/shoes/{shoeId}/colors/{colorId}",
            get(get_one).put(update).delete(delete_one),
        )
}

fn color_body(color: &ColorVariant) -> serde_json::Value {
    json!({ "color": color, "totalQuantity": color.total_quantity() })
}

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Path(shoe_id): Path<ShoeId>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store()).get(shoe_id).await?;
    let colors: Vec<serde_json::Value> = shoe.colors.iter().map(color_body).collect();
    Ok(Json(json!({ "success": true, "message": "OK", "colors": colors })))
}

#[instrument(skip(state))]
async fn get_one(
    State(state): State<AppState>,
    Path((shoe_id, color_id)): Path<(ShoeId, ColorId)>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store()).get(shoe_id).await?;
    let color = shoe
        .color(color_id)
        .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))?;
    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "color": color,
        "totalQuantity": color.total_quantity(),
    })))
}

#[instrument(skip(state, body))]
async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(shoe_id): Path<ShoeId>,
    Json(body): Json<NewColor>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let shoe = CatalogService::new(state.store())
        .add_color(shoe_id, &body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Color added", "shoe": shoe })),
    ))
}

#[instrument(skip(state, body))]
async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path((shoe_id, color_id)): Path<(ShoeId, ColorId)>,
    Json(body): Json<UpdateColor>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store())
        .update_color(shoe_id, color_id, &body)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Color updated", "shoe": shoe })))
}

#[instrument(skip(state))]
async fn delete_one(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path((shoe_id, color_id)): Path<(ShoeId, ColorId)>,
) -> Result<Json<serde_json::Value>> {
    let shoe = CatalogService::new(state.store())
        .delete_color(shoe_id, color_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Color deleted", "shoe": shoe })))
}
