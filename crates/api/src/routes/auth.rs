//! Account endpoints.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use laceup_core::UserId;

use crate::error::Result;
use crate::middleware::auth::bearer_token;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::services::auth::{AuthService, UpdateProfile};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me).put(update_me))
        .route("/auth/users", get(list_users))
        .route(
            "/auth/users/{userId}",
            get(get_user).put(set_admin).delete(delete_user),
        )
}

#[derive(Debug, Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

#[instrument(skip(state, body))]
async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let outcome = AuthService::new(state.store())
        .register(&body.email, &body.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created",
            "user": outcome.user,
            "token": outcome.token,
        })),
    ))
}

#[instrument(skip(state, body))]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<serde_json::Value>> {
    let outcome = AuthService::new(state.store())
        .login(&body.email, &body.password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Logged in",
        "user": outcome.user,
        "token": outcome.token,
    })))
}

#[instrument(skip(state, headers))]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    let token = bearer_token(&headers)?;
    AuthService::new(state.store()).logout(token).await?;
    Ok(Json(json!({ "success": true, "message": "Logged out" })))
}

#[instrument(skip(user))]
async fn me(RequireAuth(user): RequireAuth) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "OK", "user": user }))
}

#[instrument(skip(user, state, body))]
async fn update_me(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<UpdateProfile>,
) -> Result<Json<serde_json::Value>> {
    let updated = AuthService::new(state.store())
        .update_profile(user.id, &body)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated",
        "user": updated,
    })))
}

#[instrument(skip(state))]
async fn list_users(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    let users = AuthService::new(state.store()).list_users().await?;
    Ok(Json(json!({
        "success": true,
        "message": "OK",
        "users": users,
        "total": users.len(),
    })))
}

#[instrument(skip(state))]
async fn get_user(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<serde_json::Value>> {
    let user = AuthService::new(state.store()).get_user(user_id).await?;
    Ok(Json(json!({ "success": true, "message": "OK", "user": user })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetAdmin {
    is_admin: bool,
}

#[instrument(skip(state, body))]
async fn set_admin(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(body): Json<SetAdmin>,
) -> Result<Json<serde_json::Value>> {
    let user = AuthService::new(state.store())
        .set_admin(user_id, body.is_admin)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "User updated",
        "user": user,
    })))
}

#[instrument(skip(state))]
async fn delete_user(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<serde_json::Value>> {
    AuthService::new(state.store()).delete_user(user_id).await?;
    Ok(Json(json!({ "success": true, "message": "User deleted" })))
}
