//! Order endpoints: direct creation, listing, the lifecycle transition
//! endpoint, hosted-checkout kickoff and the payment webhook.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use laceup_core::{OrderId, OrderStatus, UserId};

use crate::error::{ApiError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::services::order::{NewOrderItem, OrderPage, OrderService, PageParams};
use crate::services::payment::WebhookEvent;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_own).post(create))
        .route("/orders/all", get(list_all))
        .route("/orders/webhook", post(webhook))
        .route("/orders/users/{userId}", get(list_for_user))
        .route("/orders/{orderId}", get(get_one).put(update_status))
        .route("/orders/{orderId}/checkout", get(checkout_session))
}

#[derive(Debug, Deserialize)]
struct NewOrder {
    items: Vec<NewOrderItem>,
}

#[instrument(skip(user, state, body))]
async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<NewOrder>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let order = OrderService::new(state.store())
        .create(user.id, &body.items)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created",
            "order": order,
            "totalPrice": order.total_price(),
        })),
    ))
}

fn page_body(page: &OrderPage) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "OK",
        "orders": page.orders,
        "total": page.total,
        "page": page.page,
        "length": page.length,
    }))
}

#[instrument(skip(user, state))]
async fn list_own(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>> {
    let page = OrderService::new(state.store())
        .list_own(user.id, params)
        .await?;
    Ok(page_body(&page))
}

#[derive(Debug, Default, Deserialize)]
struct OrderListQuery {
    status: Option<String>,
    page: Option<usize>,
    length: Option<usize>,
}

#[instrument(skip(state))]
async fn list_all(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<serde_json::Value>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let page = OrderService::new(state.store())
        .list_all(
            status,
            PageParams {
                page: query.page,
                length: query.length,
            },
        )
        .await?;
    Ok(page_body(&page))
}

#[instrument(skip(state))]
async fn list_for_user(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>> {
    let page = OrderService::new(state.store())
        .list_own(user_id, params)
        .await?;
    Ok(page_body(&page))
}

#[instrument(skip(user, state))]
async fn get_one(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<serde_json::Value>> {
    let order = OrderService::new(state.store()).get(order_id, &user).await?;
    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "order": order,
        "totalPrice": order.total_price(),
    })))
}

#[derive(Debug, Default, Deserialize)]
struct StatusUpdate {
    status: Option<String>,
}

/// The target status rides the query string (`?status=Shipping`); a JSON
/// body with the same field is accepted as an alternative.
fn requested_status(query: &StatusUpdate, body: Option<&StatusUpdate>) -> Result<OrderStatus> {
    query
        .status
        .as_deref()
        .or_else(|| body.and_then(|b| b.status.as_deref()))
        .ok_or_else(|| ApiError::BadRequest("status is required".to_owned()))?
        .parse()
        .map_err(ApiError::BadRequest)
}

#[instrument(skip(user, state, body))]
async fn update_status(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Query(query): Query<StatusUpdate>,
    body: Option<Json<StatusUpdate>>,
) -> Result<Json<serde_json::Value>> {
    let next = requested_status(&query, body.as_deref())?;
    let order = OrderService::new(state.store())
        .update_status(order_id, next, &user)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Order status updated",
        "order": order,
    })))
}

#[instrument(skip(user, state))]
async fn checkout_session(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<serde_json::Value>> {
    let session = OrderService::new(state.store())
        .checkout_session(order_id, &user, state.gateway())
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Checkout session created",
        "session": session,
    })))
}

/// Payment provider callback. The provider does not carry our bearer
/// tokens, so this endpoint takes no authentication.
#[instrument(skip(state, event))]
async fn webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<serde_json::Value>> {
    OrderService::new(state.store()).handle_webhook(&event).await?;
    Ok(Json(json!({ "success": true, "message": "OK" })))
}
