//! Cart endpoints. All require authentication; a caller only ever sees
//! their own cart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use laceup_core::CartItemId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::cart::{AddCartItem, CartService};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/carts", get(get_cart).post(add_item))
        .route("/carts/checkout", post(checkout))
        .route("/carts/{cartItemId}", put(update_item).delete(remove_item))
}

fn cart_body(message: &str, cart: &Cart) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": message,
        "cart": cart,
        "totalPrice": cart.total_price(),
    }))
}

#[instrument(skip(user, state))]
async fn get_cart(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    let cart = CartService::new(state.store())
        .get(user.id)
        .await?
        .unwrap_or_else(|| Cart::new(user.id));
    Ok(cart_body("OK", &cart))
}

#[instrument(skip(user, state, body))]
async fn add_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<AddCartItem>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let cart = CartService::new(state.store())
        .add_item(user.id, &body)
        .await?;
    Ok((StatusCode::CREATED, cart_body("Item added to cart", &cart)))
}

#[derive(Debug, Deserialize)]
struct UpdateCartItem {
    quantity: u32,
}

#[instrument(skip(user, state, body))]
async fn update_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateCartItem>,
) -> Result<Json<serde_json::Value>> {
    let cart = CartService::new(state.store())
        .update_item(user.id, item_id, body.quantity)
        .await?;
    Ok(cart_body("Cart item updated", &cart))
}

#[instrument(skip(user, state))]
async fn remove_item(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<serde_json::Value>> {
    let cart = CartService::new(state.store())
        .remove_item(user.id, item_id)
        .await?;
    Ok(cart_body("Cart item removed", &cart))
}

#[instrument(skip(user, state))]
async fn checkout(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let order = CartService::new(state.store()).checkout(user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created from cart",
            "order": order,
            "totalPrice": order.total_price(),
        })),
    ))
}
